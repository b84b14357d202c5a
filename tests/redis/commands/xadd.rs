use resp_server::{commands::CommandError, key_value_store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_xadd_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    let test_cases = vec![
        ("1526919030474-0", "1526919030474-0"),
        ("1526919030474-*", "1526919030474-1"),
        ("1526919030475-*", "1526919030475-0"),
        ("1526919030476", "1526919030476-0"),
    ];

    for (stream_id, expected) in test_cases {
        client
            .exec_command_success_response(
                TestUtils::xadd_command("fruits", stream_id, &["mango", "apple"]),
                TestUtils::expected_bulk_string(expected),
            )
            .await;
    }

    client
        .exec_command_success_response(
            TestUtils::command(&["XLEN", "fruits"]),
            TestUtils::expected_integer(4),
        )
        .await;
}

#[tokio::test]
async fn test_handle_xadd_command_auto_sequence_on_empty_stream() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::xadd_command("fruits", "0-*", &["mango", "apple"]),
            TestUtils::expected_bulk_string("0-1"),
        )
        .await;
}

#[tokio::test]
async fn test_handle_xadd_command_auto_id_is_increasing() {
    let env = TestEnv::new();
    let mut client = env.client();

    let mut previous = None;
    for _ in 0..3 {
        let result = client
            .exec_command(TestUtils::xadd_command("events", "*", &["kind", "click"]))
            .await;

        let resp_server::commands::CommandResult::Response(resp_server::resp::RespValue::BulkString(id)) =
            result
        else {
            panic!("Expected a bulk string ID, got {:?}", result);
        };

        let id = resp_server::key_value_store::StreamId::parse(&id).unwrap();
        if let Some(previous) = previous {
            assert!(id > previous, "{} should be greater than {}", id, previous);
        }
        previous = Some(id);
    }
}

#[tokio::test]
async fn test_handle_xadd_command_invalid_ids() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::xadd_command("fruits", "5-5", &["mango", "apple"]),
            TestUtils::expected_bulk_string("5-5"),
        )
        .await;

    let test_cases = vec![
        (
            TestUtils::xadd_command("fruits", "0-0", &["mango", "apple"]),
            CommandError::Store(StoreError::StreamIdZero),
        ),
        (
            TestUtils::xadd_command("fruits", "5-5", &["mango", "apple"]),
            CommandError::Store(StoreError::StreamIdTooSmall),
        ),
        (
            TestUtils::xadd_command("fruits", "4-*", &["mango", "apple"]),
            CommandError::Store(StoreError::StreamIdTooSmall),
        ),
        (
            TestUtils::xadd_command("fruits", "five", &["mango", "apple"]),
            CommandError::InvalidStreamId,
        ),
        (
            TestUtils::xadd_command("fruits", "6-0", &["mango"]),
            CommandError::WrongNumberOfArguments("xadd".to_string()),
        ),
    ];

    for (command, expected_error) in test_cases {
        client.exec_command_error_response(command, expected_error).await;
    }

    // A failed append to a missing key does not create it.
    client
        .exec_command_error_response(
            TestUtils::xadd_command("empty", "0-0", &["mango", "apple"]),
            CommandError::Store(StoreError::StreamIdZero),
        )
        .await;
    client
        .exec_command_success_response(
            TestUtils::type_command("empty"),
            TestUtils::expected_simple_string("none"),
        )
        .await;
}
