use resp_server::{commands::CommandError, key_value_store::StoreError, resp::RespValue};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_exec_command_immediately_after_multi_command() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    assert!(client.dispatcher.in_transaction());

    client
        .exec_command_success_response(TestUtils::exec_command(), RespValue::Array(vec![]))
        .await;
    assert!(!client.dispatcher.in_transaction());
}

#[tokio::test]
async fn test_handle_exec_and_discard_without_multi() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_error_response(TestUtils::exec_command(), CommandError::ExecWithoutMulti)
        .await;
    client
        .exec_command_error_response(TestUtils::discard_command(), CommandError::DiscardWithoutMulti)
        .await;
}

#[tokio::test]
async fn test_handle_should_queue_and_execute_commands() {
    let env = TestEnv::new();
    let mut client = env.client();
    let mut other = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;

    for command in [
        TestUtils::set_command("grapes", "4"),
        TestUtils::incr_command("grapes"),
        TestUtils::rpush_command("basket", &["mango"]),
        TestUtils::get_command("grapes"),
    ] {
        client
            .exec_command_success_response(command, TestUtils::expected_simple_string("QUEUED"))
            .await;
    }

    // Nothing runs before EXEC.
    other
        .exec_command_success_response(TestUtils::get_command("grapes"), TestUtils::expected_null())
        .await;

    client
        .exec_command_success_response(
            TestUtils::exec_command(),
            RespValue::Array(vec![
                TestUtils::expected_simple_string("OK"),
                TestUtils::expected_integer(5),
                TestUtils::expected_integer(1),
                TestUtils::expected_bulk_string("5"),
            ]),
        )
        .await;

    other
        .exec_command_success_response(TestUtils::get_command("grapes"), TestUtils::expected_bulk_string("5"))
        .await;
}

#[tokio::test]
async fn test_handle_exec_command_runs_past_failing_commands() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::set_command("fruit", "mango"), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;

    for command in [
        TestUtils::incr_command("fruit"),
        TestUtils::rpush_command("fruit", &["apple"]),
        TestUtils::set_command("fruit", "pear"),
    ] {
        client
            .exec_command_success_response(command, TestUtils::expected_simple_string("QUEUED"))
            .await;
    }

    client
        .exec_command_success_response(
            TestUtils::exec_command(),
            RespValue::Array(vec![
                CommandError::NotAnInteger.as_resp(),
                CommandError::Store(StoreError::WrongType).as_resp(),
                TestUtils::expected_simple_string("OK"),
            ]),
        )
        .await;

    client
        .exec_command_success_response(TestUtils::get_command("fruit"), TestUtils::expected_bulk_string("pear"))
        .await;
}

#[tokio::test]
async fn test_handle_exec_command_aborts_after_queueing_error() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(TestUtils::set_command("grapes", "4"), TestUtils::expected_simple_string("QUEUED"))
        .await;

    client
        .exec_command_error_response(
            TestUtils::command(&["FLY", "away"]),
            CommandError::UnknownCommand("FLY".to_string()),
        )
        .await;
    client
        .exec_command_error_response(
            TestUtils::command(&["GET"]),
            CommandError::WrongNumberOfArguments("get".to_string()),
        )
        .await;

    client
        .exec_command_error_response(TestUtils::exec_command(), CommandError::ExecAborted)
        .await;
    assert!(!client.dispatcher.in_transaction());

    client
        .exec_command_success_response(TestUtils::get_command("grapes"), TestUtils::expected_null())
        .await;
}

#[tokio::test]
async fn test_handle_subscribe_inside_multi_taints_transaction() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_error_response(
            TestUtils::subscribe_command(&["news"]),
            CommandError::NotAllowedInTransaction("SUBSCRIBE".to_string()),
        )
        .await;
    client
        .exec_command_error_response(TestUtils::exec_command(), CommandError::ExecAborted)
        .await;
    assert!(!client.dispatcher.is_subscribed());
}

#[tokio::test]
async fn test_handle_nested_multi_and_discard() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(TestUtils::set_command("grapes", "4"), TestUtils::expected_simple_string("QUEUED"))
        .await;
    client
        .exec_command_error_response(TestUtils::multi_command(), CommandError::NestedMulti)
        .await;
    assert!(client.dispatcher.in_transaction());

    client
        .exec_command_success_response(TestUtils::discard_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(TestUtils::get_command("grapes"), TestUtils::expected_null())
        .await;
}

#[tokio::test]
async fn test_handle_blocking_commands_inside_exec_do_not_block() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;

    for command in [
        TestUtils::blpop_command("queue", "0"),
        TestUtils::rpush_command("queue", &["job"]),
        TestUtils::brpop_command("queue", "0"),
        TestUtils::xread_blocking_command("0", &["events"], &["$"]),
    ] {
        client
            .exec_command_success_response(command, TestUtils::expected_simple_string("QUEUED"))
            .await;
    }

    client
        .exec_command_success_response(
            TestUtils::exec_command(),
            RespValue::Array(vec![
                TestUtils::expected_null_array(),
                TestUtils::expected_integer(1),
                TestUtils::expected_bulk_string_array(&["queue", "job"]),
                TestUtils::expected_null_array(),
            ]),
        )
        .await;
}

#[tokio::test]
async fn test_handle_publish_inside_exec() {
    let env = TestEnv::new();
    let mut subscriber = env.client();
    let mut client = env.client();

    subscriber
        .exec_command_multiple_responses(
            TestUtils::subscribe_command(&["news"]),
            vec![TestUtils::expected_subscription("subscribe", "news", 1)],
        )
        .await;

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(
            TestUtils::publish_command("news", "batched"),
            TestUtils::expected_simple_string("QUEUED"),
        )
        .await;
    client
        .exec_command_success_response(
            TestUtils::exec_command(),
            RespValue::Array(vec![TestUtils::expected_integer(1)]),
        )
        .await;

    assert_eq!(
        subscriber.try_next_message(),
        Some(TestUtils::expected_bulk_string_array(&["message", "news", "batched"]))
    );
}

#[tokio::test]
async fn test_handle_exec_aborts_after_too_many_arguments_queued() {
    let env = TestEnv::new();
    let mut client = env.client();

    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(TestUtils::set_command("k", "v"), TestUtils::expected_simple_string("QUEUED"))
        .await;

    let test_cases = vec![
        (TestUtils::command(&["PING", "a", "b"]), "ping"),
        (TestUtils::command(&["LPOP", "k", "1", "2"]), "lpop"),
        (TestUtils::command(&["ZRANGE", "z", "0", "1", "WITHSCORES", "REV"]), "zrange"),
        (TestUtils::command(&["XRANGE", "s", "-", "+", "COUNT", "1", "2"]), "xrange"),
    ];

    for (command, name) in test_cases {
        client
            .exec_command_error_response(command, CommandError::WrongNumberOfArguments(name.to_string()))
            .await;
    }

    client
        .exec_command_error_response(TestUtils::exec_command(), CommandError::ExecAborted)
        .await;
    client
        .exec_command_success_response(TestUtils::get_command("k"), TestUtils::expected_null())
        .await;
}
