use resp_server::{commands::CommandError, key_value_store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

async fn setup_leaderboard(env: &TestEnv) {
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::command(&["ZADD", "board", "3", "carol", "1", "alice", "2", "bob"]),
            TestUtils::expected_integer(3),
        )
        .await;
}

#[tokio::test]
async fn test_handle_zadd_command_updates_existing_members() {
    let env = TestEnv::new();
    setup_leaderboard(&env).await;
    let mut client = env.client();

    let test_cases = vec![
        (
            TestUtils::command(&["ZADD", "board", "0.5", "bob", "4", "dave"]),
            TestUtils::expected_integer(1),
        ),
        (TestUtils::command(&["ZCARD", "board"]), TestUtils::expected_integer(4)),
        (
            TestUtils::command(&["ZRANGE", "board", "0", "-1"]),
            TestUtils::expected_bulk_string_array(&["bob", "alice", "carol", "dave"]),
        ),
        (
            TestUtils::command(&["ZSCORE", "board", "bob"]),
            TestUtils::expected_bulk_string("0.5"),
        ),
        (TestUtils::command(&["ZSCORE", "board", "erin"]), TestUtils::expected_null()),
    ];

    for (command, expected) in test_cases {
        client.exec_command_success_response(command, expected).await;
    }
}

#[tokio::test]
async fn test_handle_zrank_and_zrange_commands() {
    let env = TestEnv::new();
    setup_leaderboard(&env).await;
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::zadd_command("board", "2", "aaron"),
            TestUtils::expected_integer(1),
        )
        .await;

    let test_cases = vec![
        (TestUtils::command(&["ZRANK", "board", "alice"]), TestUtils::expected_integer(0)),
        // Equal scores are ordered by member.
        (TestUtils::command(&["ZRANK", "board", "aaron"]), TestUtils::expected_integer(1)),
        (TestUtils::command(&["ZRANK", "board", "bob"]), TestUtils::expected_integer(2)),
        (TestUtils::command(&["ZRANK", "board", "erin"]), TestUtils::expected_null()),
        (TestUtils::command(&["ZRANK", "missing", "erin"]), TestUtils::expected_null()),
        (
            TestUtils::command(&["ZRANGE", "board", "1", "2"]),
            TestUtils::expected_bulk_string_array(&["aaron", "bob"]),
        ),
        (
            TestUtils::command(&["ZRANGE", "board", "-2", "-1", "WITHSCORES"]),
            TestUtils::expected_bulk_string_array(&["bob", "2", "carol", "3"]),
        ),
        (
            TestUtils::command(&["ZRANGE", "board", "5", "10"]),
            TestUtils::expected_bulk_string_array(&[]),
        ),
        (
            TestUtils::command(&["ZRANGEBYSCORE", "board", "2", "+inf"]),
            TestUtils::expected_bulk_string_array(&["aaron", "bob", "carol"]),
        ),
        (
            TestUtils::command(&["ZRANGEBYSCORE", "board", "(1", "(3", "withscores"]),
            TestUtils::expected_bulk_string_array(&["aaron", "2", "bob", "2"]),
        ),
        (
            TestUtils::command(&["ZRANGEBYSCORE", "board", "-inf", "0"]),
            TestUtils::expected_bulk_string_array(&[]),
        ),
    ];

    for (command, expected) in test_cases {
        client.exec_command_success_response(command, expected).await;
    }
}

#[tokio::test]
async fn test_handle_zrem_command_deletes_empty_set() {
    let env = TestEnv::new();
    setup_leaderboard(&env).await;
    let mut client = env.client();

    let test_cases = vec![
        (
            TestUtils::command(&["ZREM", "board", "alice", "erin"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["ZREM", "board", "bob", "carol"]),
            TestUtils::expected_integer(2),
        ),
        (TestUtils::command(&["ZCARD", "board"]), TestUtils::expected_integer(0)),
        (TestUtils::type_command("board"), TestUtils::expected_simple_string("none")),
    ];

    for (command, expected) in test_cases {
        client.exec_command_success_response(command, expected).await;
    }
}

#[tokio::test]
async fn test_handle_sorted_set_command_errors() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::set_command("name", "alice"),
            TestUtils::expected_simple_string("OK"),
        )
        .await;

    let test_cases = vec![
        (
            TestUtils::command(&["ZADD", "board", "1", "alice", "2"]),
            CommandError::SyntaxError,
        ),
        (
            TestUtils::command(&["ZADD", "board", "high", "alice"]),
            CommandError::NotAFloat,
        ),
        (
            TestUtils::command(&["ZADD", "board", "nan", "alice"]),
            CommandError::NotAFloat,
        ),
        (
            TestUtils::zadd_command("name", "1", "alice"),
            CommandError::Store(StoreError::WrongType),
        ),
        (
            TestUtils::command(&["ZRANGEBYSCORE", "board", "low", "1"]),
            CommandError::InvalidScoreRange,
        ),
        (
            TestUtils::command(&["ZRANGE", "board", "0", "1", "REV"]),
            CommandError::SyntaxError,
        ),
    ];

    for (command, expected_error) in test_cases {
        client.exec_command_error_response(command, expected_error).await;
    }

    // A rejected ZADD writes nothing.
    client
        .exec_command_success_response(
            TestUtils::type_command("board"),
            TestUtils::expected_simple_string("none"),
        )
        .await;
}
