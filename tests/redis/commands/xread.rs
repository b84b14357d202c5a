use std::time::Duration;

use resp_server::{commands::CommandError, resp::RespValue};
use tokio::time::Instant;

use crate::test_utils::{TestEnv, TestUtils};

fn stream_reply(key: &str, stream_ids: &[&str]) -> RespValue {
    RespValue::Array(vec![
        TestUtils::expected_bulk_string(key),
        RespValue::Array(
            stream_ids
                .iter()
                .map(|stream_id| TestUtils::expected_stream_entry(stream_id, &["mango", "apple"]))
                .collect(),
        ),
    ])
}

#[tokio::test]
async fn test_handle_xread_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    for key in ["fruits", "exotic fruits"] {
        for stream_id in ["1526919030404-0", "1526919030404-1", "1526919030414-0"] {
            client
                .exec_command_success_response(
                    TestUtils::xadd_command(key, stream_id, &["mango", "apple"]),
                    TestUtils::expected_bulk_string(stream_id),
                )
                .await;
        }
    }

    let test_cases: Vec<(&[&str], &[&str], RespValue)> = vec![
        (
            &["fruits"],
            &["1526919030404-0"],
            RespValue::Array(vec![stream_reply(
                "fruits",
                &["1526919030404-1", "1526919030414-0"],
            )]),
        ),
        (
            &["fruits"],
            &["0-0"],
            RespValue::Array(vec![stream_reply(
                "fruits",
                &["1526919030404-0", "1526919030404-1", "1526919030414-0"],
            )]),
        ),
        (
            &["fruits", "exotic fruits"],
            &["1526919030404-1", "1526919030414-0"],
            RespValue::Array(vec![stream_reply("fruits", &["1526919030414-0"])]),
        ),
        (
            &["fruits", "exotic fruits"],
            &["1526919030404-1", "1526919030404-1"],
            RespValue::Array(vec![
                stream_reply("fruits", &["1526919030414-0"]),
                stream_reply("exotic fruits", &["1526919030414-0"]),
            ]),
        ),
        (&["fruits"], &["1526919030414-0"], TestUtils::expected_null_array()),
        (&["missing"], &["0-0"], TestUtils::expected_null_array()),
    ];

    for (keys, start_stream_ids, expected) in test_cases {
        client
            .exec_command_success_response(TestUtils::xread_command(keys, start_stream_ids), expected)
            .await;
    }

    client
        .exec_command_success_response(
            TestUtils::command(&["XREAD", "COUNT", "1", "STREAMS", "fruits", "0"]),
            RespValue::Array(vec![stream_reply("fruits", &["1526919030404-0"])]),
        )
        .await;
}

#[tokio::test]
async fn test_handle_xread_command_invalid_arguments() {
    let env = TestEnv::new();
    let mut client = env.client();

    let test_cases = vec![
        (
            TestUtils::command(&["XREAD", "STREAMS", "a", "b", "0"]),
            CommandError::UnbalancedXreadStreams,
        ),
        (
            TestUtils::command(&["XREAD", "FOREVER", "STREAMS", "a", "0"]),
            CommandError::SyntaxError,
        ),
        (
            TestUtils::command(&["XREAD", "STREAMS", "a", "zero"]),
            CommandError::InvalidStreamId,
        ),
    ];

    for (command, expected_error) in test_cases {
        client.exec_command_error_response(command, expected_error).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_handle_xread_blocking_command_wakes_on_xadd() {
    let env = TestEnv::new();

    env.client()
        .exec_command_success_response(
            TestUtils::xadd_command("fruits", "1-0", &["mango", "apple"]),
            TestUtils::expected_bulk_string("1-0"),
        )
        .await;

    let first = env.spawn_command_task(TestUtils::xread_blocking_command("1000", &["fruits"], &["$"]));
    let second = env.spawn_command_task(TestUtils::xread_blocking_command("0", &["fruits"], &["1-0"]));
    TestUtils::sleep_ms(100).await;

    env.client()
        .exec_command_success_response(
            TestUtils::xadd_command("fruits", "2-0", &["mango", "apple"]),
            TestUtils::expected_bulk_string("2-0"),
        )
        .await;

    // Every reader blocked on the stream sees the new entry.
    for task in [first, second] {
        assert_eq!(
            TestUtils::wait_for_completion(task, Duration::from_secs(2)).await,
            RespValue::Array(vec![stream_reply("fruits", &["2-0"])])
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_handle_xread_blocking_command_timeout() {
    let env = TestEnv::new();

    let started = Instant::now();
    let task = env.spawn_command_task(TestUtils::xread_blocking_command("500", &["fruits"], &["$"]));

    assert_eq!(
        TestUtils::wait_for_completion(task, Duration::from_secs(2)).await,
        TestUtils::expected_null_array()
    );
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(600),
        "replied after {:?}",
        elapsed
    );
    assert_eq!(env.get_store().await.blocking().blocked_clients(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_handle_xread_blocking_command_ignores_other_keys_and_list_pushes() {
    let env = TestEnv::new();

    let task = env.spawn_command_task(TestUtils::xread_blocking_command("1000", &["fruits"], &["$"]));
    TestUtils::sleep_ms(100).await;

    env.client()
        .exec_command_success_response(
            TestUtils::xadd_command("vegetables", "1-0", &["mango", "apple"]),
            TestUtils::expected_bulk_string("1-0"),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(task, Duration::from_secs(2)).await,
        TestUtils::expected_null_array()
    );
}
