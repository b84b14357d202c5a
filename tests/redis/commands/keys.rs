use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_keys_del_exists_and_dbsize_commands() {
    let env = TestEnv::new();
    let mut client = env.client();

    for key in ["grape", "grapefruit", "mango"] {
        client
            .exec_command_success_response(
                TestUtils::set_command(key, "1"),
                TestUtils::expected_simple_string("OK"),
            )
            .await;
    }

    let test_cases = vec![
        (
            TestUtils::command(&["KEYS", "*"]),
            TestUtils::expected_bulk_string_array(&["grape", "grapefruit", "mango"]),
        ),
        (
            TestUtils::command(&["KEYS", "grape*"]),
            TestUtils::expected_bulk_string_array(&["grape", "grapefruit"]),
        ),
        (
            TestUtils::command(&["KEYS", "?ango"]),
            TestUtils::expected_bulk_string_array(&["mango"]),
        ),
        (
            TestUtils::command(&["EXISTS", "grape", "mango", "grape", "pear"]),
            TestUtils::expected_integer(3),
        ),
        (TestUtils::command(&["DBSIZE"]), TestUtils::expected_integer(3)),
        (
            TestUtils::command(&["DEL", "grape", "pear"]),
            TestUtils::expected_integer(1),
        ),
        (TestUtils::command(&["DBSIZE"]), TestUtils::expected_integer(2)),
        (
            TestUtils::command(&["KEYS", "grape*"]),
            TestUtils::expected_bulk_string_array(&["grapefruit"]),
        ),
    ];

    for (command, expected) in test_cases {
        client.exec_command_success_response(command, expected).await;
    }
}
