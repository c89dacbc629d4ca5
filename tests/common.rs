use gumdrop::Options;
use httpmock::MockServer;

use storefront_swarm::config::SwarmConfiguration;
use storefront_swarm::metrics::SwarmMetrics;
use storefront_swarm::swarm::Profile;
use storefront_swarm::SwarmAttack;

// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
// compiler warnings during testing.

/// The following options are configured by default, if not set to a custom value:
///  --host <mock-server>
///  --users 1
///  --hatch-rate 1
///  --run-time 1
pub fn build_configuration(server: &MockServer, custom: Vec<&str>) -> SwarmConfiguration {
    // Start with an empty configuration.
    let mut configuration: Vec<&str> = vec![];
    // Declare server_url here no matter what, so its lifetime is sufficient when needed.
    let server_url = server.base_url();

    // Merge in all custom options first.
    configuration.extend_from_slice(&custom);

    // Default to using mock server if not otherwise configured.
    if !configuration.contains(&"--host") {
        configuration.extend_from_slice(&["--host", &server_url]);
    }

    // Default to testing with 1 user if not otherwise configured.
    if !configuration.contains(&"--users") {
        configuration.extend_from_slice(&["--users", "1"]);
    }

    // Default to hatch 1 user per second if not otherwise configured.
    if !configuration.contains(&"--hatch-rate") {
        configuration.extend_from_slice(&["--hatch-rate", "1"]);
    }

    // Default to running for 1 second if not otherwise configured.
    if !configuration.contains(&"--run-time") {
        configuration.extend_from_slice(&["--run-time", "1"]);
    }

    // Parse these options to generate a SwarmConfiguration.
    SwarmConfiguration::parse_args_default(&configuration)
        .expect("failed to parse options and generate a configuration")
}

/// Create a SwarmAttack object from the configuration and profile.
pub fn build_load_test(configuration: SwarmConfiguration, profile: &Profile) -> SwarmAttack {
    SwarmAttack::initialize_with_config(configuration).register_profile(profile.clone())
}

/// Run the actual load test, returning the SwarmMetrics.
pub async fn run_load_test(swarm_attack: SwarmAttack) -> SwarmMetrics {
    swarm_attack.execute().await.unwrap()
}

/// Helper to delete test artifacts, if existing.
#[allow(dead_code)]
pub fn cleanup_files(files: Vec<&str>) {
    for file in files {
        if std::path::Path::new(file).exists() {
            std::fs::remove_file(file).expect("failed to remove file");
        }
    }
}
