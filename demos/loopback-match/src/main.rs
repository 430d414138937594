//! Two peers in one process: pair up through copied codes, play a match,
//! take a rematch, and leave.
//!
//! ```text
//! cargo run -p loopback-match            # in-process transport
//! cargo run -p loopback-match -- ws      # WebSocket over loopback
//! RUST_LOG=debug cargo run -p loopback-match
//! ```

use pairplay::prelude::*;

/// Host plays X down the left column; guest answers in the middle.
const SCRIPT: [usize; 5] = [0, 4, 3, 5, 6];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pairplay::logging::init();

    if std::env::args().nth(1).as_deref() == Some("ws") {
        run(|| WebSocketTransport::new("127.0.0.1:0")).await?;
    } else {
        let network = MemoryNetwork::new();
        let guest_network = network.clone();
        run_pair(move || network.transport(), move || guest_network.transport()).await?;
    }
    Ok(())
}

async fn run<T, F>(new_transport: F) -> Result<(), PairplayError>
where
    T: PeerTransport,
    F: Fn() -> T + Clone + Send + 'static,
{
    run_pair(new_transport.clone(), new_transport).await
}

async fn run_pair<T, H, G>(host_transport: H, guest_transport: G) -> Result<(), PairplayError>
where
    T: PeerTransport,
    H: FnMut() -> T + Send + 'static,
    G: FnMut() -> T + Send + 'static,
{
    let (host, host_driver) = pairplay::driver(CoordinatorConfig::new().player_name("Ada"), host_transport);
    let (guest, guest_driver) = pairplay::driver(CoordinatorConfig::new().player_name("Bo"), guest_transport);
    tokio::spawn(host_driver.run());
    tokio::spawn(guest_driver.run());

    host.create().await?;
    host.wait_for(|v| v.phase == ConnectionPhase::Waiting).await?;
    let offer = host.copy_code()?;
    println!("host code:  {offer}");

    guest.join(&offer).await?;
    guest.wait_for(|v| v.phase == ConnectionPhase::AnswerInput).await?;
    let answer = guest.copy_code()?;
    println!("guest code: {answer}");

    host.submit_answer(&answer).await?;
    host.wait_for(|v| v.phase == ConnectionPhase::Connected).await?;
    guest.wait_for(|v| v.phase == ConnectionPhase::Connected).await?;
    println!("connected\n");

    play_match(&host, &guest).await?;

    guest.request_rematch().await?;
    host.wait_for(|v| v.rematch_pending).await?;
    host.accept_rematch().await?;
    let view = guest
        .wait_for(|v| v.phase == ConnectionPhase::Connected && v.status.is_playing())
        .await?;
    println!("rematch accepted, {} moves first\n", if view.is_local_turn { "Bo" } else { "Ada" });

    play_match(&guest, &host).await?;

    host.leave().await?;
    let view = guest.wait_for(|v| v.phase == ConnectionPhase::Disconnected).await?;
    println!("guest sees: {}", view.error.unwrap_or_default());
    guest.leave().await?;
    Ok(())
}

/// Plays [`SCRIPT`] with `first` moving first.
async fn play_match(first: &DriverHandle, second: &DriverHandle) -> Result<(), PairplayError> {
    for (turn, cell) in SCRIPT.into_iter().enumerate() {
        let (mover, other) = if turn % 2 == 0 { (first, second) } else { (second, first) };
        mover.wait_for(|v| v.is_local_turn).await?;
        mover.play_move(cell).await?;
        // Wait for the move to land on the other board before continuing.
        other.wait_for(|v| v.board.get(cell).is_some()).await?;
    }
    let view = first.view();
    print_board(&view);
    match view.status {
        GameStatus::Won { winner, .. } => println!("{winner} wins\n"),
        GameStatus::Draw => println!("draw\n"),
        GameStatus::Playing => println!("still playing\n"),
    }
    Ok(())
}

fn print_board(view: &SessionView) {
    for row in view.board.cells().chunks(3) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| cell.map_or_else(|| ".".to_string(), |s| s.to_string()))
            .collect();
        println!("  {}", line.join(" "));
    }
}
