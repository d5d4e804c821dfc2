use cycle_client::use_cases::GamePhase;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let mut handle = cycle_client::run_with_config().await?;

    // The engine process is started out of band and told our port; from
    // here the client is purely reactive until the terminal event.
    while handle.phase_rx.changed().await.is_ok() {
        let phase = handle.phase_rx.borrow().clone();
        if let GamePhase::Over { death_order } = phase {
            tracing::info!(order = ?death_order, "game over");
            break;
        }
    }

    Ok(())
}
