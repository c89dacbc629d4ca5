use storefront_swarm::prelude::*;

#[tokio::main]
async fn main() -> Result<(), SwarmError> {
    SwarmAttack::initialize()?
        .register_profile(storefront::online_store_user()?)
        // Overridden with --host.
        .set_default(SwarmDefault::Host, "http://localhost:8080")?
        .execute()
        .await?;

    Ok(())
}
