//! Two peers applying the same sequence of moves locally must agree on
//! every step, and refuse the same stale or forged moves.

use pairplay_protocol::{MoveMessage, Symbol};
use pairplay_session::{
    ConnectionPhase, GameMode, GameStatus, MatchState, MoveRejection, RemoteSession, check_move,
    is_local_player_turn,
};
use pairplay_signal::SessionId;

fn connect(session: &mut RemoteSession) {
    let middle = if session.is_host() {
        ConnectionPhase::Waiting
    } else {
        ConnectionPhase::AnswerInput
    };
    for phase in [middle, ConnectionPhase::Connecting, ConnectionPhase::Connected] {
        session.transition(phase).unwrap();
    }
}

fn pair() -> (RemoteSession, RemoteSession) {
    let id = SessionId::parse("AB3CDE").unwrap();
    let mut host = RemoteSession::host(id.clone(), "Ada");
    let mut guest = RemoteSession::guest(id, "Bo");
    connect(&mut host);
    connect(&mut guest);
    (host, guest)
}

/// Plays `cell` from `mover`'s side and mirrors it onto the other side
/// the way an incoming move would be handled.
fn play(
    mover: &RemoteSession,
    mover_game: &mut MatchState,
    other_game: &mut MatchState,
    cell: u8,
) -> GameStatus {
    let message = MoveMessage {
        cell_index: cell,
        player: mover.local().symbol,
        move_number: mover_game.next_move_number(),
    };
    mover_game
        .apply_move(usize::from(cell), message.player)
        .unwrap();
    check_move(
        &message,
        other_game.board(),
        other_game.current_turn(),
        other_game.next_move_number(),
    )
    .unwrap();
    other_game
        .apply_move(usize::from(cell), message.player)
        .unwrap()
}

#[test]
fn test_turn_ownership_alternates_between_peers() {
    let (host, guest) = pair();
    let mut host_game = MatchState::new(Symbol::X);
    let mut guest_game = MatchState::new(Symbol::X);

    assert!(is_local_player_turn(GameMode::Remote, Some(&host), &host_game));
    assert!(!is_local_player_turn(GameMode::Remote, Some(&guest), &guest_game));

    play(&host, &mut host_game, &mut guest_game, 4);

    assert!(!is_local_player_turn(GameMode::Remote, Some(&host), &host_game));
    assert!(is_local_player_turn(GameMode::Remote, Some(&guest), &guest_game));
}

#[test]
fn test_boards_agree_through_a_full_match() {
    let (host, guest) = pair();
    let mut host_game = MatchState::new(Symbol::X);
    let mut guest_game = MatchState::new(Symbol::X);

    // X: 0, 1, 2 wins the top row.
    play(&host, &mut host_game, &mut guest_game, 0);
    play(&guest, &mut guest_game, &mut host_game, 3);
    play(&host, &mut host_game, &mut guest_game, 1);
    play(&guest, &mut guest_game, &mut host_game, 4);
    let status = play(&host, &mut host_game, &mut guest_game, 2);

    assert_eq!(
        status,
        GameStatus::Won {
            winner: Symbol::X,
            line: [0, 1, 2]
        }
    );
    assert_eq!(host_game.board(), guest_game.board());
    assert_eq!(host_game.status(), guest_game.status());
    assert!(!is_local_player_turn(GameMode::Remote, Some(&guest), &guest_game));
}

#[test]
fn test_replayed_move_is_refused() {
    let (host, _guest) = pair();
    let mut host_game = MatchState::new(Symbol::X);
    let mut guest_game = MatchState::new(Symbol::X);
    play(&host, &mut host_game, &mut guest_game, 4);

    let replay = MoveMessage {
        cell_index: 4,
        player: Symbol::X,
        move_number: 1,
    };
    let err = check_move(
        &replay,
        guest_game.board(),
        guest_game.current_turn(),
        guest_game.next_move_number(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        MoveRejection::WrongPlayer {
            expected: Symbol::O,
            got: Symbol::X
        }
    );
}

#[test]
fn test_move_from_the_future_is_refused() {
    let guest_game = MatchState::new(Symbol::X);
    let skipped = MoveMessage {
        cell_index: 0,
        player: Symbol::X,
        move_number: 3,
    };
    let err = check_move(
        &skipped,
        guest_game.board(),
        guest_game.current_turn(),
        guest_game.next_move_number(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        MoveRejection::WrongMoveNumber {
            expected: 1,
            got: 3
        }
    );
}

#[test]
fn test_rematch_alternation_is_identical_on_both_peers() {
    let (mut host, mut guest) = pair();
    for _ in 0..4 {
        let host_starter = host.begin_next_match();
        let guest_starter = guest.begin_next_match();
        assert_eq!(host_starter, guest_starter);
        assert_eq!(host.last_starter(), guest.last_starter());
    }
    // After an even number of rematches the host starts again.
    assert_eq!(host.last_starter().symbol(), Symbol::X);
}

#[test]
fn test_symbols_survive_rematches() {
    let (mut host, mut guest) = pair();
    host.begin_next_match();
    guest.begin_next_match();
    assert_eq!(host.local().symbol, Symbol::X);
    assert_eq!(guest.local().symbol, Symbol::O);
    assert_ne!(host.local().symbol, host.remote().symbol);
}
