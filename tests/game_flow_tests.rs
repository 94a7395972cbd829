//! End-to-end game flow against the library surface: rooms are created,
//! joined, and played through the same handlers the WebSocket layer calls,
//! with outbound messages captured on per-connection channels.
//!
//! Tests run on a paused tokio clock, so answer/vote windows and
//! presentation holds elapse instantly whenever the test is waiting.

use std::sync::Arc;
use std::time::Duration;

use quipwits_server::config::Config;
use quipwits_server::protocol::{
    ClientMessage, ConnectionId, ErrorCode, GameState, HostId, PlayerId, ServerMessage, NO_ANSWER,
};
use quipwits_server::server::GameServer;
use tokio::sync::mpsc;
use uuid::Uuid;

struct Client {
    connection: ConnectionId,
    rx: mpsc::Receiver<Arc<ServerMessage>>,
}

fn attach(server: &Arc<GameServer>) -> Client {
    let (tx, rx) = mpsc::channel(1024);
    let connection = Uuid::new_v4();
    server.messenger().register(connection, tx);
    Client { connection, rx }
}

async fn send(server: &Arc<GameServer>, client: &Client, message: ClientMessage) {
    server.handle_client_message(client.connection, message).await;
}

/// Receive until a message matches, discarding interleaved broadcasts
/// (room updates, timer ticks, progress events).
async fn expect<F>(client: &mut Client, what: &str, pred: F) -> Arc<ServerMessage>
where
    F: Fn(&ServerMessage) -> bool,
{
    for _ in 0..2000 {
        let message = tokio::time::timeout(Duration::from_secs(1200), client.rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
            .unwrap_or_else(|| panic!("channel closed waiting for {what}"));
        if pred(&message) {
            return message;
        }
    }
    panic!("never saw {what} within 2000 messages");
}

async fn create_room(server: &Arc<GameServer>, host: &mut Client) -> (String, HostId) {
    send(server, host, ClientMessage::CreateRoom { host_id: None }).await;
    let created = expect(host, "ROOM_CREATED", |m| {
        matches!(m, ServerMessage::RoomCreated { .. })
    })
    .await;
    match created.as_ref() {
        ServerMessage::RoomCreated {
            room_code, host_id, ..
        } => (room_code.clone(), *host_id),
        _ => unreachable!(),
    }
}

async fn join(server: &Arc<GameServer>, code: &str, name: &str) -> (PlayerId, Client) {
    let mut client = attach(server);
    send(
        server,
        &client,
        ClientMessage::JoinRoom {
            room_code: code.to_string(),
            player_name: name.to_string(),
        },
    )
    .await;
    let joined = expect(&mut client, "ROOM_JOINED", |m| {
        matches!(m, ServerMessage::RoomJoined { .. })
    })
    .await;
    match joined.as_ref() {
        ServerMessage::RoomJoined { player_id, .. } => (*player_id, client),
        _ => unreachable!(),
    }
}

/// Collect each player's assigned prompts for the round that just started.
async fn receive_prompts(players: &mut [(PlayerId, Client)]) -> Vec<Vec<String>> {
    let mut all = Vec::new();
    for (_, client) in players.iter_mut() {
        let message = expect(client, "RECEIVE_PROMPTS", |m| {
            matches!(m, ServerMessage::ReceivePrompts { .. })
        })
        .await;
        match message.as_ref() {
            ServerMessage::ReceivePrompts { prompts, .. } => {
                all.push(prompts.iter().map(|p| p.id.clone()).collect());
            }
            _ => unreachable!(),
        }
    }
    all
}

/// Submit a distinct answer for every assigned prompt.
async fn answer_all(
    server: &Arc<GameServer>,
    code: &str,
    players: &[(PlayerId, Client)],
    assignments: &[Vec<String>],
) {
    for ((player_id, client), prompts) in players.iter().zip(assignments) {
        for prompt_id in prompts {
            send(
                server,
                client,
                ClientMessage::SubmitAnswer {
                    room_code: code.to_string(),
                    prompt_id: Some(prompt_id.clone()),
                    answer: format!("{player_id} on {prompt_id}"),
                    is_last_lash: false,
                },
            )
            .await;
        }
    }
}

/// Play out one voting phase: for each matchup the sole non-author votes
/// for answer 1. Returns after the round scoreboard appears.
async fn vote_through_round(
    server: &Arc<GameServer>,
    code: &str,
    host: &mut Client,
    players: &[(PlayerId, Client)],
) {
    let matchup_count = match expect(host, "VOTING_PHASE", |m| {
        matches!(m, ServerMessage::VotingPhase { .. })
    })
    .await
    .as_ref()
    {
        ServerMessage::VotingPhase { matchup_count } => *matchup_count,
        _ => unreachable!(),
    };

    for _ in 0..matchup_count {
        let matchup = expect(host, "VOTE_MATCHUP", |m| {
            matches!(m, ServerMessage::VoteMatchup(_))
        })
        .await;
        let (prompt_id, player1, player2) = match matchup.as_ref() {
            ServerMessage::VoteMatchup(view) => {
                (view.prompt_id.clone(), view.player1_id, view.player2_id)
            }
            _ => unreachable!(),
        };

        for (player_id, client) in players {
            if *player_id == player1 || *player_id == player2 {
                continue;
            }
            send(
                server,
                client,
                ClientMessage::SubmitVote {
                    room_code: code.to_string(),
                    prompt_id: prompt_id.clone(),
                    vote: 1,
                },
            )
            .await;
        }

        expect(host, "MATCHUP_RESULT", |m| {
            matches!(m, ServerMessage::MatchupResult(_))
        })
        .await;
    }

    expect(host, "ROUND_SCORES", |m| {
        matches!(m, ServerMessage::RoundScores { .. })
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_full_game_with_minimum_roster() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _host_id) = create_room(&server, &mut host).await;

    // join with a lowercase code: lookup is case-insensitive
    let mut players = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        players.push(join(&server, &code.to_lowercase(), name).await);
    }

    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    expect(&mut host, "GAME_STARTED", |m| {
        matches!(m, ServerMessage::GameStarted { .. })
    })
    .await;

    // Two regular rounds
    for _round in 0..2 {
        let assignments = receive_prompts(&mut players).await;
        // 3 players x 2 prompts each, two authors per prompt
        for prompts in &assignments {
            assert_eq!(prompts.len(), 2);
        }
        let total: usize = assignments.iter().map(Vec::len).sum();
        assert_eq!(total, 6);

        answer_all(&server, &code, &players, &assignments).await;
        vote_through_round(&server, &code, &mut host, &players).await;
    }

    // Finale: mode reveal, host continues, everyone answers and votes
    expect(&mut host, "LAST_WIT_MODE_REVEAL", |m| {
        matches!(m, ServerMessage::LastWitModeReveal { .. })
    })
    .await;
    send(
        &server,
        &host,
        ClientMessage::ContinueLastWit {
            room_code: code.clone(),
        },
    )
    .await;

    for (_, client) in players.iter_mut() {
        expect(client, "LAST_LASH_PROMPT", |m| {
            matches!(m, ServerMessage::LastLashPrompt(_))
        })
        .await;
    }
    for (index, (_, client)) in players.iter().enumerate() {
        send(
            &server,
            client,
            ClientMessage::SubmitAnswer {
                room_code: code.clone(),
                prompt_id: None,
                answer: format!("finale entry {index}"),
                is_last_lash: true,
            },
        )
        .await;
    }

    let voting = expect(&mut host, "LAST_LASH_VOTING", |m| {
        matches!(m, ServerMessage::LastLashVoting { .. })
    })
    .await;
    match voting.as_ref() {
        ServerMessage::LastLashVoting { entries, .. } => assert_eq!(entries.len(), 3),
        _ => unreachable!(),
    }

    // everyone votes for the next player around the table
    let ids: Vec<PlayerId> = players.iter().map(|(id, _)| *id).collect();
    for (index, (_, client)) in players.iter().enumerate() {
        send(
            &server,
            client,
            ClientMessage::SubmitLastLashVotes {
                room_code: code.clone(),
                votes: vec![ids[(index + 1) % ids.len()]],
            },
        )
        .await;
    }

    expect(&mut host, "LAST_LASH_RESULTS", |m| {
        matches!(m, ServerMessage::LastLashResults { .. })
    })
    .await;

    let over = expect(&mut host, "GAME_OVER", |m| {
        matches!(m, ServerMessage::GameOver { .. })
    })
    .await;
    match over.as_ref() {
        ServerMessage::GameOver { winners, scoreboard } => {
            assert_eq!(scoreboard.len(), 3);
            assert!(!winners.is_empty());
            let top = scoreboard[0].score;
            for winner in winners {
                assert_eq!(winner.score, top);
            }
            // scoreboard is sorted descending
            for pair in scoreboard.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
        _ => unreachable!(),
    }

    // terminal room ignores further host game events
    send(
        &server,
        &host,
        ClientMessage::EndGame {
            room_code: code.clone(),
        },
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_remaining_time() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _) = create_room(&server, &mut host).await;
    let mut players = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        players.push(join(&server, &code, name).await);
    }
    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    receive_prompts(&mut players).await;

    // 30 s of the 90 s answer window elapse
    tokio::time::advance(Duration::from_secs(30)).await;

    send(
        &server,
        &host,
        ClientMessage::PauseGame {
            room_code: code.clone(),
        },
    )
    .await;
    let paused = expect(&mut host, "GAME_PAUSED", |m| {
        matches!(m, ServerMessage::GamePaused { .. })
    })
    .await;
    let frozen = match paused.as_ref() {
        ServerMessage::GamePaused { remaining } => (*remaining).expect("remaining while paused"),
        _ => unreachable!(),
    };
    assert!((59..=61).contains(&frozen), "froze at {frozen}");

    // no ticks while paused, even as wall time runs on
    while host.rx.try_recv().is_ok() {}
    tokio::time::advance(Duration::from_secs(600)).await;
    tokio::task::yield_now().await;
    while let Ok(message) = host.rx.try_recv() {
        assert!(
            !matches!(message.as_ref(), ServerMessage::TimerUpdate { .. }),
            "tick delivered during pause"
        );
    }

    send(
        &server,
        &host,
        ClientMessage::ResumeGame {
            room_code: code.clone(),
        },
    )
    .await;
    let resumed = expect(&mut host, "GAME_RESUMED", |m| {
        matches!(m, ServerMessage::GameResumed { .. })
    })
    .await;
    match resumed.as_ref() {
        ServerMessage::GameResumed { remaining } => {
            assert_eq!(*remaining, Some(frozen), "resume must restore the frozen clock");
        }
        _ => unreachable!(),
    }

    // the countdown picks up where it stopped
    tokio::time::advance(Duration::from_secs(2)).await;
    let tick = expect(&mut host, "TIMER_UPDATE", |m| {
        matches!(m, ServerMessage::TimerUpdate { .. })
    })
    .await;
    match tick.as_ref() {
        ServerMessage::TimerUpdate { remaining } => assert!(*remaining < frozen),
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_player_gets_sentinel_answers() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _) = create_room(&server, &mut host).await;
    let mut players = Vec::new();
    for name in ["Alice", "Bob", "Carol", "Dana"] {
        players.push(join(&server, &code, name).await);
    }
    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    let assignments = receive_prompts(&mut players).await;

    // Dana drops; the other three answer everything
    let (dana_id, dana) = players.pop().unwrap();
    server.handle_disconnect(dana.connection).await;
    answer_all(&server, &code, &players, &assignments[..3]).await;

    // the answer timer closes the window for Dana
    expect(&mut host, "VOTING_PHASE", |m| {
        matches!(m, ServerMessage::VotingPhase { .. })
    })
    .await;

    let room_arc = server.registry().get(&code).await.expect("room still live");
    let room = room_arc.lock().await;
    assert_eq!(room.state, GameState::Voting);
    for prompt in &room.prompts {
        assert!(prompt.both_answered());
        if prompt.player1 == dana_id {
            assert_eq!(prompt.answer1.as_deref(), Some(NO_ANSWER));
        }
        if prompt.player2 == dana_id {
            assert_eq!(prompt.answer2.as_deref(), Some(NO_ANSWER));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_lobby_admission_errors() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _) = create_room(&server, &mut host).await;

    // unknown room
    let mut stranger = attach(&server);
    send(
        &server,
        &stranger,
        ClientMessage::JoinRoom {
            room_code: "ZZZZ".to_string(),
            player_name: "Ghost".to_string(),
        },
    )
    .await;
    let err = expect(&mut stranger, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => assert_eq!(*code, Some(ErrorCode::RoomNotFound)),
        _ => unreachable!(),
    }

    let (_, _alice) = join(&server, &code, "Alice").await;

    // case-insensitive duplicate name
    let mut dupe = attach(&server);
    send(
        &server,
        &dupe,
        ClientMessage::JoinRoom {
            room_code: code.clone(),
            player_name: "ALICE".to_string(),
        },
    )
    .await;
    let err = expect(&mut dupe, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => assert_eq!(*code, Some(ErrorCode::NameTaken)),
        _ => unreachable!(),
    }

    // too few players to start
    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    let err = expect(&mut host, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => {
            assert_eq!(*code, Some(ErrorCode::NotEnoughPlayers));
        }
        _ => unreachable!(),
    }

    // only the host may start
    let (_, bob) = join(&server, &code, "Bob").await;
    let (_, _carol) = join(&server, &code, "Carol").await;
    let mut bob = bob;
    send(
        &server,
        &bob,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    let err = expect(&mut bob, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => assert_eq!(*code, Some(ErrorCode::NotHost)),
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_room_fills_at_eight_players() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _) = create_room(&server, &mut host).await;

    for i in 0..8 {
        let _ = join(&server, &code, &format!("Player{i}")).await;
    }

    let mut ninth = attach(&server);
    send(
        &server,
        &ninth,
        ClientMessage::JoinRoom {
            room_code: code.clone(),
            player_name: "Ninth".to_string(),
        },
    )
    .await;
    let err = expect(&mut ninth, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => assert_eq!(*code, Some(ErrorCode::RoomFull)),
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_host_and_player_reconnection() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, host_id) = create_room(&server, &mut host).await;
    let mut players = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        players.push(join(&server, &code, name).await);
    }
    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: Some("space".to_string()),
        },
    )
    .await;
    receive_prompts(&mut players).await;

    // host display crashes and relaunches
    server.handle_disconnect(host.connection).await;
    let mut new_host = attach(&server);
    send(
        &server,
        &new_host,
        ClientMessage::RejoinHost {
            room_code: code.to_lowercase(),
            host_id,
        },
    )
    .await;
    let resync = expect(&mut new_host, "REJOIN_HOST_SUCCESS", |m| {
        matches!(m, ServerMessage::RejoinHostSuccess(_))
    })
    .await;
    match resync.as_ref() {
        ServerMessage::RejoinHostSuccess(view) => {
            assert_eq!(view.room.state, GameState::Prompt);
            assert_eq!(view.room.theme.as_deref(), Some("space"));
            assert!(view.timer_remaining.is_some());
        }
        _ => unreachable!(),
    }

    // wrong host identity is rejected
    let mut impostor = attach(&server);
    send(
        &server,
        &impostor,
        ClientMessage::RejoinHost {
            room_code: code.clone(),
            host_id: Uuid::new_v4(),
        },
    )
    .await;
    let err = expect(&mut impostor, "ERROR", |m| matches!(m, ServerMessage::Error { .. })).await;
    match err.as_ref() {
        ServerMessage::Error { code, .. } => assert_eq!(*code, Some(ErrorCode::InvalidHost)),
        _ => unreachable!(),
    }

    // a player drops and reattaches with their stable id
    let (alice_id, alice) = players.remove(0);
    server.handle_disconnect(alice.connection).await;
    let mut alice_again = attach(&server);
    send(
        &server,
        &alice_again,
        ClientMessage::Rejoin {
            player_id: alice_id,
            room_code: code.clone(),
        },
    )
    .await;
    let resync = expect(&mut alice_again, "REJOIN_SUCCESS", |m| {
        matches!(m, ServerMessage::RejoinSuccess(_))
    })
    .await;
    match resync.as_ref() {
        ServerMessage::RejoinSuccess(view) => {
            assert_eq!(view.pending_prompts.len(), 2);
            let me = view
                .room
                .players
                .iter()
                .find(|p| p.id == alice_id)
                .expect("still seated");
            assert!(me.connected);
        }
        _ => unreachable!(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_end_game_tears_the_room_down() {
    let server = GameServer::new_offline(Arc::new(Config::default()));
    let mut host = attach(&server);
    let (code, _) = create_room(&server, &mut host).await;
    let mut players = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        players.push(join(&server, &code, name).await);
    }
    send(
        &server,
        &host,
        ClientMessage::StartGame {
            room_code: code.clone(),
            theme: None,
        },
    )
    .await;
    receive_prompts(&mut players).await;

    send(
        &server,
        &host,
        ClientMessage::EndGame {
            room_code: code.clone(),
        },
    )
    .await;
    let over = expect(&mut host, "GAME_OVER", |m| {
        matches!(m, ServerMessage::GameOver { .. })
    })
    .await;
    match over.as_ref() {
        ServerMessage::GameOver { winners, scoreboard } => {
            assert_eq!(scoreboard.len(), 3);
            // nobody scored; everyone ties for the win
            assert_eq!(winners.len(), 3);
        }
        _ => unreachable!(),
    }

    assert!(server.registry().get(&code).await.is_none());
}
