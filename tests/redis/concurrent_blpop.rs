use std::time::Duration;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test(start_paused = true)]
async fn test_blpop_concurrent_clients_are_served_in_arrival_order() {
    let env = TestEnv::new();

    let first = env.spawn_command_task(TestUtils::blpop_command("orders", "5"));
    TestUtils::sleep_ms(10).await;
    let second = env.spawn_command_task(TestUtils::blpop_command("orders", "5"));
    TestUtils::sleep_ms(10).await;
    let third = env.spawn_command_task(TestUtils::brpop_command("orders", "5"));
    TestUtils::sleep_ms(10).await;

    assert_eq!(env.get_store().await.blocking().waiters_on(b"orders"), 3);

    env.client()
        .exec_command_success_response(
            TestUtils::rpush_command("orders", &["a", "b"]),
            TestUtils::expected_integer(2),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(first, Duration::from_secs(1)).await,
        TestUtils::expected_bulk_string_array(&["orders", "a"])
    );
    assert_eq!(
        TestUtils::wait_for_completion(second, Duration::from_secs(1)).await,
        TestUtils::expected_bulk_string_array(&["orders", "b"])
    );

    // The list was drained by the first two clients; the third keeps waiting.
    assert_eq!(env.get_store().await.blocking().waiters_on(b"orders"), 1);
    assert!(!env.get_store().await.exists(b"orders"));

    env.client()
        .exec_command_success_response(
            TestUtils::lpush_command("orders", &["c"]),
            TestUtils::expected_integer(1),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(third, Duration::from_secs(1)).await,
        TestUtils::expected_bulk_string_array(&["orders", "c"])
    );
}

#[tokio::test(start_paused = true)]
async fn test_blpop_waiting_on_several_keys_gets_one_element() {
    let env = TestEnv::new();

    let task = env.spawn_command_task(TestUtils::command(&["BLPOP", "left", "right", "0"]));
    TestUtils::sleep_ms(10).await;

    let mut client = env.client();
    client
        .exec_command_success_response(TestUtils::multi_command(), TestUtils::expected_simple_string("OK"))
        .await;
    client
        .exec_command_success_response(
            TestUtils::rpush_command("right", &["r"]),
            TestUtils::expected_simple_string("QUEUED"),
        )
        .await;
    client
        .exec_command_success_response(
            TestUtils::rpush_command("left", &["l"]),
            TestUtils::expected_simple_string("QUEUED"),
        )
        .await;
    client
        .exec_command_success_response(
            TestUtils::exec_command(),
            resp_server::resp::RespValue::Array(vec![
                TestUtils::expected_integer(1),
                TestUtils::expected_integer(1),
            ]),
        )
        .await;

    // Keys are served in the order they became ready.
    assert_eq!(
        TestUtils::wait_for_completion(task, Duration::from_secs(1)).await,
        TestUtils::expected_bulk_string_array(&["right", "r"])
    );

    let mut store = env.get_store().await;
    assert_eq!(store.blocking().blocked_clients(), 0);
    assert!(store.exists(b"left"));
    assert!(!store.exists(b"right"));
}

#[tokio::test(start_paused = true)]
async fn test_blpop_timed_out_client_is_skipped() {
    let env = TestEnv::new();

    let impatient = env.spawn_command_task(TestUtils::blpop_command("orders", "0.1"));
    TestUtils::sleep_ms(10).await;
    let patient = env.spawn_command_task(TestUtils::blpop_command("orders", "0"));

    assert_eq!(
        TestUtils::wait_for_completion(impatient, Duration::from_secs(1)).await,
        TestUtils::expected_null_array()
    );

    env.client()
        .exec_command_success_response(
            TestUtils::rpush_command("orders", &["a"]),
            TestUtils::expected_integer(1),
        )
        .await;

    assert_eq!(
        TestUtils::wait_for_completion(patient, Duration::from_secs(1)).await,
        TestUtils::expected_bulk_string_array(&["orders", "a"])
    );
}
