use futures::StreamExt;
use rand::Rng;
use redis::aio::MultiplexedConnection;
use redis::{RedisError, Value};
use respgrid::config::Config;
use respgrid::server::serve;
use respgrid::store::MemoryStore;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(serve(listener, Arc::new(MemoryStore::new()), Config::default()));

    address
}

async fn connect(address: SocketAddr) -> Result<MultiplexedConnection, RedisError> {
    let client = redis::Client::open(format!("redis://{}/", address))?;
    client.get_multiplexed_async_connection().await
}

async fn query(f: impl FnOnce(&mut redis::Pipeline)) -> Result<Vec<Value>, RedisError> {
    let mut connection = connect(start_server().await).await.unwrap();

    let mut pipeline = redis::pipe();
    f(&mut pipeline);

    pipeline.query_async(&mut connection).await
}

fn data(s: &str) -> Value {
    Value::Data(s.as_bytes().to_vec())
}

fn array(values: &[&str]) -> Value {
    Value::Bulk(values.iter().map(|v| data(v)).collect())
}

/// The server's error line, as the client saw it.
async fn query_err(f: impl FnOnce(&mut redis::Pipeline)) -> String {
    match query(f).await {
        Ok(values) => panic!("expected an error, got {:?}", values),
        Err(err) => err.to_string(),
    }
}

#[tokio::test]
async fn test_set_and_get() {
    let res = query(|p| {
        p.cmd("SET").arg("set_get_key_1").arg(1);
        p.cmd("SET").arg("set_get_key_2").arg("Argentina");
        p.cmd("SET").arg("set_get_key_3").arg("");

        p.cmd("GET").arg("set_get_key_1");
        p.cmd("GET").arg("set_get_key_2");
        p.cmd("GET").arg("set_get_key_3");
        p.cmd("GET").arg("set_get_nonexistentkey");
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![
            Value::Okay,
            Value::Okay,
            Value::Okay,
            data("1"),
            data("Argentina"),
            data(""),
            Value::Nil,
        ]
    );
}

#[tokio::test]
async fn test_del() {
    let res = query(|p| {
        p.cmd("SET").arg("del_key_1").arg(1);
        p.cmd("RPUSH").arg("del_key_2").arg("a");

        p.cmd("DEL").arg("del_key_1").arg("del_key_2").arg("del_key_3");
        p.cmd("DEL").arg("del_key_1");
        p.cmd("GET").arg("del_key_1");
        p.cmd("LLEN").arg("del_key_2");
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![
            Value::Okay,
            Value::Int(1),
            Value::Int(2),
            Value::Int(0),
            Value::Nil,
            Value::Int(0),
        ]
    );
}

#[tokio::test]
async fn test_incrbyfloat() {
    let res = query(|p| {
        p.cmd("SET").arg("incrbyfloat_key_1").arg("10.50");
        p.cmd("INCRBYFLOAT").arg("incrbyfloat_key_1").arg(0.1);
        p.cmd("INCRBYFLOAT").arg("incrbyfloat_key_2").arg(5);
        p.cmd("INCRBYFLOAT").arg("incrbyfloat_key_2").arg(-7.5);
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![Value::Okay, data("10.6"), data("5"), data("-2.5")]
    );
}

#[tokio::test]
async fn test_lists() {
    let res = query(|p| {
        p.cmd("RPUSH").arg("list").arg("b").arg("c");
        p.cmd("LPUSH").arg("list").arg("a");
        p.cmd("LLEN").arg("list");
        p.cmd("LRANGE").arg("list").arg(0).arg(-1);
        p.cmd("LINDEX").arg("list").arg(-1);
        p.cmd("LINDEX").arg("list").arg(10);
        p.cmd("LPOP").arg("list");
        p.cmd("RPOP").arg("list").arg(5);
        p.cmd("LLEN").arg("list");
        p.cmd("LPOP").arg("list");
        p.cmd("LPOP").arg("list").arg(2);
        p.cmd("LRANGE").arg("list").arg(0).arg(-1);
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![
            Value::Int(2),
            Value::Int(3),
            Value::Int(3),
            array(&["a", "b", "c"]),
            data("c"),
            Value::Nil,
            data("a"),
            array(&["c", "b"]),
            Value::Int(0),
            Value::Nil,
            Value::Nil,
            array(&[]),
        ]
    );
}

#[tokio::test]
async fn test_random_pushes_and_pops() {
    let mut connection = connect(start_server().await).await.unwrap();
    let mut model = VecDeque::new();
    let mut rng = rand::thread_rng();

    for i in 0..200 {
        let value = i.to_string();
        match rng.gen_range(0..4) {
            0 => {
                let len: usize = redis::cmd("LPUSH")
                    .arg("random")
                    .arg(&value)
                    .query_async(&mut connection)
                    .await
                    .unwrap();
                model.push_front(value);
                assert_eq!(len, model.len());
            }
            1 => {
                let len: usize = redis::cmd("RPUSH")
                    .arg("random")
                    .arg(&value)
                    .query_async(&mut connection)
                    .await
                    .unwrap();
                model.push_back(value);
                assert_eq!(len, model.len());
            }
            2 => {
                let popped: Option<String> = redis::cmd("LPOP")
                    .arg("random")
                    .query_async(&mut connection)
                    .await
                    .unwrap();
                assert_eq!(popped, model.pop_front());
            }
            _ => {
                let popped: Option<String> = redis::cmd("RPOP")
                    .arg("random")
                    .query_async(&mut connection)
                    .await
                    .unwrap();
                assert_eq!(popped, model.pop_back());
            }
        }
    }

    let all: Vec<String> = redis::cmd("LRANGE")
        .arg("random")
        .arg(0)
        .arg(-1)
        .query_async(&mut connection)
        .await
        .unwrap();
    assert_eq!(all, model.into_iter().collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pushes() {
    let address = start_server().await;
    let clients = 8;
    let pushes = 50;

    let handles: Vec<_> = (0..clients)
        .map(|client| {
            tokio::spawn(async move {
                let mut connection = connect(address).await.unwrap();
                for i in 0..pushes {
                    let _: usize = redis::cmd("RPUSH")
                        .arg("shared")
                        .arg(format!("{}-{}", client, i))
                        .query_async(&mut connection)
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let mut connection = connect(address).await.unwrap();
    let len: usize = redis::cmd("LLEN")
        .arg("shared")
        .query_async(&mut connection)
        .await
        .unwrap();
    assert_eq!(len, clients * pushes);
}

#[tokio::test]
async fn test_lcs() {
    let res = query(|p| {
        p.cmd("SET").arg("lcs_key_1").arg("ohmytext");
        p.cmd("SET").arg("lcs_key_2").arg("mynewtext");
        p.cmd("LCS").arg("lcs_key_1").arg("lcs_key_2");
        p.cmd("LCS").arg("lcs_key_1").arg("lcs_key_2").arg("LEN");
        p.cmd("LCS")
            .arg("lcs_key_1")
            .arg("lcs_key_2")
            .arg("IDX")
            .arg("MINMATCHLEN")
            .arg(4)
            .arg("WITHMATCHLEN");
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![
            Value::Okay,
            Value::Okay,
            data("mytext"),
            Value::Int(6),
            Value::Bulk(vec![
                data("matches"),
                Value::Bulk(vec![Value::Bulk(vec![
                    Value::Bulk(vec![Value::Int(4), Value::Int(7)]),
                    Value::Bulk(vec![Value::Int(5), Value::Int(8)]),
                    Value::Int(4),
                ])]),
                data("len"),
                Value::Int(6),
            ]),
        ]
    );
}

#[tokio::test]
async fn test_connection_commands() {
    let res = query(|p| {
        p.cmd("PING");
        p.cmd("PING").arg("hello");
        p.cmd("ECHO").arg("world");
        p.cmd("READWRITE");
        p.cmd("READONLY");
        p.cmd("CONFIG").arg("GET").arg("appendonly");
        p.cmd("CONFIG").arg("SET").arg("appendonly").arg("yes");
    })
    .await
    .unwrap();

    assert_eq!(
        res,
        vec![
            data("PONG"),
            data("hello"),
            data("world"),
            Value::Okay,
            Value::Okay,
            Value::Bulk(vec![
                Value::Status("appendonly".to_string()),
                Value::Status("no".to_string()),
            ]),
            Value::Okay,
        ]
    );
}

#[tokio::test]
async fn test_wrong_type() {
    let err = query_err(|p| {
        p.cmd("SET").arg("wrongtype_key").arg("a");
        p.cmd("LPUSH").arg("wrongtype_key").arg("b");
    })
    .await;

    assert!(err.contains("Operation against a key holding the wrong kind of value"), "{}", err);
}

#[tokio::test]
async fn test_unknown_command() {
    let err = query_err(|p| {
        p.cmd("FLUSHDB");
    })
    .await;

    assert!(err.contains("unknown command 'FLUSHDB'"), "{}", err);
}

#[tokio::test]
async fn test_wrong_number_of_arguments() {
    let err = query_err(|p| {
        p.cmd("LRANGE").arg("list").arg(0);
    })
    .await;

    assert!(
        err.contains("wrong number of arguments for 'lrange' command"),
        "{}",
        err
    );
}

#[tokio::test]
async fn test_connection_survives_errors() {
    let mut connection = connect(start_server().await).await.unwrap();

    let res: Result<Value, RedisError> = redis::cmd("NOPE").query_async(&mut connection).await;
    assert!(res.is_err());

    let pong: String = redis::cmd("PING").query_async(&mut connection).await.unwrap();
    assert_eq!(pong, "PONG");
}

#[tokio::test]
async fn test_pubsub_with_redis_client() {
    let address = start_server().await;
    let client = redis::Client::open(format!("redis://{}/", address)).unwrap();

    let mut pubsub = client.get_async_pubsub().await.unwrap();
    pubsub.subscribe("news").await.unwrap();

    let mut publisher = connect(address).await.unwrap();
    let received: i64 = redis::cmd("PUBLISH")
        .arg("news")
        .arg("hello")
        .query_async(&mut publisher)
        .await
        .unwrap();
    assert_eq!(received, 0);

    let mut messages = pubsub.on_message();
    let message = tokio::time::timeout(std::time::Duration::from_secs(5), messages.next())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(message.get_channel_name(), "news");
    assert_eq!(message.get_payload::<String>().unwrap(), "hello");
}
