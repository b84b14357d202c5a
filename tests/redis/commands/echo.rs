use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_echo_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    let test_cases = vec!["grape", "hello world", ""];

    for message in test_cases {
        client
            .exec_command_success_response(
                TestUtils::echo_command(message),
                TestUtils::expected_bulk_string(message),
            )
            .await;
    }
}
