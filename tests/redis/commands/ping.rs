use resp_server::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_ping_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::ping_command(),
            TestUtils::expected_simple_string("PONG"),
        )
        .await;

    client
        .exec_command_success_response(
            TestUtils::command(&["ping", "hello"]),
            TestUtils::expected_bulk_string("hello"),
        )
        .await;

    client
        .exec_command_error_response(
            TestUtils::command(&["PING", "a", "b"]),
            CommandError::WrongNumberOfArguments("ping".to_string()),
        )
        .await;
}

#[tokio::test]
async fn test_handle_ping_command_while_subscribed() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_multiple_responses(
            TestUtils::subscribe_command(&["news"]),
            vec![TestUtils::expected_subscription("subscribe", "news", 1)],
        )
        .await;

    client
        .exec_command_success_response(
            TestUtils::ping_command(),
            TestUtils::expected_bulk_string_array(&["pong", ""]),
        )
        .await;

    client
        .exec_command_success_response(
            TestUtils::command(&["PING", "still here"]),
            TestUtils::expected_bulk_string_array(&["pong", "still here"]),
        )
        .await;
}
