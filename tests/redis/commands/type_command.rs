use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_type_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    let setup = vec![
        (TestUtils::set_command("grape", "mango"), TestUtils::expected_simple_string("OK")),
        (TestUtils::rpush_command("fruits", &["apple"]), TestUtils::expected_integer(1)),
        (
            TestUtils::xadd_command("events", "1-1", &["kind", "click"]),
            TestUtils::expected_bulk_string("1-1"),
        ),
        (TestUtils::zadd_command("scores", "1", "alice"), TestUtils::expected_integer(1)),
    ];

    for (command, expected) in setup {
        client.exec_command_success_response(command, expected).await;
    }

    let test_cases = vec![
        ("grape", "string"),
        ("fruits", "list"),
        ("events", "stream"),
        ("scores", "zset"),
        ("missing", "none"),
    ];

    for (key, expected) in test_cases {
        client
            .exec_command_success_response(
                TestUtils::type_command(key),
                TestUtils::expected_simple_string(expected),
            )
            .await;
    }
}
