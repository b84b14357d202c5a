use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_lpop_and_rpop_commands() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(
            TestUtils::rpush_command("grape", &["mango", "raspberry", "apple", "banana"]),
            TestUtils::expected_integer(4),
        )
        .await;

    let test_cases = vec![
        (TestUtils::lpop_command("grape"), TestUtils::expected_bulk_string("mango")),
        (
            TestUtils::command(&["RPOP", "grape"]),
            TestUtils::expected_bulk_string("banana"),
        ),
        (
            TestUtils::lpop_command_multiple_items("grape", 5),
            TestUtils::expected_bulk_string_array(&["raspberry", "apple"]),
        ),
        (TestUtils::lpop_command("grape"), TestUtils::expected_null()),
        (
            TestUtils::lpop_command_multiple_items("grape", 2),
            TestUtils::expected_null_array(),
        ),
    ];

    for (command, expected) in test_cases {
        client.exec_command_success_response(command, expected).await;
    }

    // An emptied list no longer exists.
    client
        .exec_command_success_response(
            TestUtils::type_command("grape"),
            TestUtils::expected_simple_string("none"),
        )
        .await;
}
