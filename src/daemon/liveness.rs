use tracing::debug;

use crate::server::Console;

/// Ask the console for the status command and report whether it succeeded.
/// Output is discarded; a client that cannot even be spawned counts as down.
pub async fn is_running(console: &dyn Console, status_command: &str) -> bool {
    match console.send(status_command).await {
        Ok(reply) => reply.success(),
        Err(e) => {
            debug!("Liveness probe could not run: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::fake::FakeWorld;

    #[tokio::test]
    async fn mirrors_the_relay_status() {
        let world = FakeWorld::new("list", "minecraft");
        world.script_probes(&[true, false]);

        assert!(is_running(world.console.as_ref(), "list").await);
        assert!(!is_running(world.console.as_ref(), "list").await);
        assert_eq!(world.count("console:list"), 2);
    }

    #[tokio::test]
    async fn unreachable_client_is_down() {
        let world = FakeWorld::new("list", "minecraft");
        *world.console.fail_all.lock().unwrap() = true;
        assert!(!is_running(world.console.as_ref(), "list").await);
    }
}
