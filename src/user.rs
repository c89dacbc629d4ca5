use std::time::{self, Duration};

use crate::metrics::{SwarmMetric, TaskMetric};
use crate::swarm::{Profile, SwarmUser, SwarmUserCommand, TaskFunction};

// Never sleep more than 500 milliseconds, allowing a sleeping user to shut down
// quickly when the load test ends.
const MAXIMUM_SLEEP_TIME: u64 = 500;

pub(crate) async fn user_main(
    thread_number: usize,
    thread_profile: Profile,
    mut thread_user: SwarmUser,
    thread_receiver: flume::Receiver<SwarmUserCommand>,
) {
    info!(
        "launching user {} from {}...",
        thread_number, thread_profile.name
    );

    let iterations = thread_user.config.iterations;
    let mut completed = 0;

    'launch_tasks: loop {
        // Determine which task we're going to run next. The generator is not held
        // across the await below.
        let thread_task_index = match thread_profile.select_task(&mut rand::rng()) {
            Some(index) => index,
            None => {
                info!(
                    "user {} from {} has no enabled tasks",
                    thread_number, thread_profile.name
                );
                break 'launch_tasks;
            }
        };
        let task = &thread_profile.tasks[thread_task_index];
        debug!(
            "[user {}]: launching {} task from {}",
            thread_number, task.name, thread_profile.name
        );
        invoke_task_function(&task.function, &mut thread_user, thread_task_index, &task.name)
            .await;

        completed += 1;
        if iterations > 0 && completed >= iterations {
            info!(
                "user {} from {} completed {} iterations",
                thread_number, thread_profile.name, completed
            );
            break 'launch_tasks;
        }

        if received_exit(&thread_receiver) {
            break 'launch_tasks;
        }

        // If a wait time is defined, wait for a random time between tasks.
        let wait = thread_profile.sample_wait(&mut rand::rng());
        if let Some(wait) = wait {
            let mut wait_time = wait.as_millis() as u64;

            while wait_time > 0 {
                // Exit immediately if message received from parent.
                if received_exit(&thread_receiver) {
                    break 'launch_tasks;
                }

                // Wake regularly to detect if the load test has shut down.
                let sleep_duration = if wait_time > MAXIMUM_SLEEP_TIME {
                    wait_time -= MAXIMUM_SLEEP_TIME;
                    Duration::from_millis(MAXIMUM_SLEEP_TIME)
                } else {
                    let sleep_duration = Duration::from_millis(wait_time);
                    wait_time = 0;
                    sleep_duration
                };

                trace!(
                    "user {} from {} sleeping {:?} ...",
                    thread_number,
                    thread_profile.name,
                    sleep_duration
                );

                tokio::time::sleep(sleep_duration).await;
            }
        }
    }

    info!(
        "exiting user {} from {}...",
        thread_number, thread_profile.name
    );
}

// Determine if the parent has sent a SwarmUserCommand::Exit message. A closed
// channel means the parent is gone, which is treated the same way.
fn received_exit(thread_receiver: &flume::Receiver<SwarmUserCommand>) -> bool {
    match thread_receiver.try_recv() {
        Ok(SwarmUserCommand::Exit) | Err(flume::TryRecvError::Disconnected) => true,
        Err(flume::TryRecvError::Empty) => false,
    }
}

// Invoke the task function, collecting task metrics.
async fn invoke_task_function(
    function: &TaskFunction,
    thread_user: &mut SwarmUser,
    thread_task_index: usize,
    thread_task_name: &str,
) {
    let started = time::Instant::now();
    let mut raw_task = TaskMetric::new(
        thread_user.started.elapsed().as_millis(),
        thread_user.profiles_index,
        thread_task_index,
        thread_task_name.to_string(),
        thread_user.weighted_users_index,
    );

    let success = match function(thread_user).await {
        Ok(()) => true,
        Err(e) => {
            warn!("task {} failed: {}", thread_task_name, e);
            false
        }
    };
    raw_task.set_time(started.elapsed().as_millis(), success);

    if let Some(parent) = thread_user.channel_to_parent.as_ref() {
        // Best effort metrics.
        if let Err(e) = parent.send(SwarmMetric::Task(raw_task)) {
            debug!("failed to send {} task metric: {}", thread_task_name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SwarmConfiguration, Tags};
    use crate::swarm::TaskResult;
    use crate::{profile, task};
    use url::Url;

    async fn noop(_user: &mut SwarmUser) -> TaskResult {
        Ok(())
    }

    fn user(config: &SwarmConfiguration) -> (SwarmUser, flume::Receiver<SwarmMetric>) {
        let (tx, rx) = flume::unbounded();
        let mut user = SwarmUser::new(0, Url::parse("http://127.0.0.1").unwrap(), config).unwrap();
        user.weighted_users_index = 0;
        user.channel_to_parent = Some(tx);
        (user, rx)
    }

    #[test]
    fn exit_commands() {
        let (tx, rx) = flume::unbounded();
        assert!(!received_exit(&rx));
        tx.send(SwarmUserCommand::Exit).unwrap();
        assert!(received_exit(&rx));
        drop(tx);
        assert!(received_exit(&rx));
    }

    #[tokio::test]
    async fn runs_configured_iterations() {
        let config = SwarmConfiguration {
            iterations: 3,
            ..Default::default()
        };
        let mut profile = profile!("Shopper").register_task(task!(noop).set_name("noop"));
        profile.apply_tag_filter(&Tags::default(), &Tags::default());
        let (thread_user, metrics) = user(&config);
        let (_tx, rx) = flume::unbounded();

        user_main(0, profile, thread_user, rx).await;

        let tasks: Vec<SwarmMetric> = metrics.drain().collect();
        assert_eq!(tasks.len(), 3);
        for metric in tasks {
            match metric {
                SwarmMetric::Task(task) => {
                    assert_eq!(task.name, "noop");
                    assert!(task.success);
                }
                SwarmMetric::Request(_) => panic!("no requests expected"),
            }
        }
    }

    #[tokio::test]
    async fn runs_after_driver_stops_listening() {
        let config = SwarmConfiguration {
            iterations: 2,
            ..Default::default()
        };
        let mut profile = profile!("Shopper").register_task(task!(noop));
        profile.apply_tag_filter(&Tags::default(), &Tags::default());
        let (thread_user, metrics) = user(&config);
        drop(metrics);
        let (_tx, rx) = flume::unbounded();

        // Task metrics can't be delivered, the user still completes its iterations.
        tokio::time::timeout(Duration::from_secs(2), user_main(0, profile, thread_user, rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn exits_without_enabled_tasks() {
        let config = SwarmConfiguration::default();
        let mut profile = profile!("Shopper").register_task(task!(noop).set_tag("view"));
        profile.apply_tag_filter(&Tags::default(), &"view".parse().unwrap());
        let (thread_user, metrics) = user(&config);
        let (_tx, rx) = flume::unbounded();

        user_main(0, profile, thread_user, rx).await;

        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn exits_while_waiting() {
        let config = SwarmConfiguration::default();
        let mut profile = profile!("Shopper")
            .register_task(task!(noop))
            .set_wait_time(Duration::from_secs(60), Duration::from_secs(60))
            .unwrap();
        profile.apply_tag_filter(&Tags::default(), &Tags::default());
        let (thread_user, metrics) = user(&config);
        let (tx, rx) = flume::unbounded();

        let handle = tokio::spawn(user_main(0, profile, thread_user, rx));
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(SwarmUserCommand::Exit).unwrap();

        // The user wakes within one sleep slice.
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metrics.len(), 1);
    }
}
