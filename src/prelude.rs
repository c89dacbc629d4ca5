pub use crate::config::{SwarmDefault, SwarmDefaultType};
pub use crate::metrics::{SwarmMetrics, SwarmRequestMetrics, SwarmTaskMetrics};
pub use crate::storefront;
pub use crate::swarm::{
    Profile, RequestMethod, SwarmResponse, SwarmUser, Task, TaskError, TaskFunction, TaskResult,
};
pub use crate::{profile, task, SwarmAttack, SwarmError};
