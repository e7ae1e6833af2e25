use bytes::Bytes;
use std::sync::Arc;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::{MatchRange, Reply};
use crate::handler::{Dispatch, Failure, RespHandler};
use crate::store::{Store, Value};
use crate::utils::lcs::{lcs, MAX_TABLE_BYTES};

/// The LCS command implements the longest common subsequence algorithm.
///
/// Note that this is different than the longest common string algorithm,
/// since matching characters in the string does not need to be contiguous.
///
/// With `IDX` the reply lists the matching ranges of both strings instead of the subsequence.
///
/// Ref: <https://redis.io/docs/latest/commands/lcs>
#[derive(Debug, PartialEq)]
pub struct Lcs {
    pub key1: Bytes,
    pub key2: Bytes,
    pub len: bool,
    pub idx: bool,
    pub min_match_len: usize,
    pub with_match_len: bool,
}

async fn string_value(store: &Arc<dyn Store>, key: &Bytes) -> Result<Bytes, Failure> {
    match store.get(key).await?.as_deref() {
        Some(Value::Bytes(value)) => Ok(value.clone()),
        Some(_) => Err(Failure::Reply(
            "ERR The specified keys must contain string values".to_string(),
        )),
        None => Ok(Bytes::new()),
    }
}

impl Executable for Lcs {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();

        Dispatch::pending(handler, async move {
            let a = string_value(&store, &self.key1).await?;
            let b = string_value(&store, &self.key2).await?;

            // Quadratic in the input sizes, so it runs on the blocking pool.
            let res = tokio::task::spawn_blocking(move || lcs(&a, &b, MAX_TABLE_BYTES))
                .await
                .map_err(|err| Failure::Fatal(err.into()))?
                .map_err(|err| Failure::Reply(err.to_string()))?;

            if self.len {
                return Ok(Reply::Integer(res.sequence.len() as i64));
            }

            if !self.idx {
                return Ok(Reply::Bulk(Bytes::from(res.sequence)));
            }

            let matches = res
                .matches
                .iter()
                .filter(|m| m.len() >= self.min_match_len)
                .map(|m| MatchRange {
                    a: m.a,
                    b: m.b,
                    len: self.with_match_len.then(|| m.len()),
                })
                .collect();

            Ok(Reply::Matches {
                matches,
                len: res.sequence.len(),
            })
        })
    }
}

impl TryFrom<&mut CommandParser> for Lcs {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut lcs = Self {
            key1: parser.next_bytes()?,
            key2: parser.next_bytes()?,
            len: false,
            idx: false,
            min_match_len: 0,
            with_match_len: false,
        };

        while parser.has_remaining() {
            let option = parser.next_string()?;
            match option.to_uppercase().as_str() {
                "LEN" => lcs.len = true,
                "IDX" => lcs.idx = true,
                "WITHMATCHLEN" => lcs.with_match_len = true,
                "MINMATCHLEN" => {
                    // Negative lengths behave like 0.
                    lcs.min_match_len = parser.next_integer()?.max(0) as usize;
                }
                _ => return Err(CommandParserError::Syntax),
            }
        }

        if lcs.len && lcs.idx {
            return Err(CommandParserError::Invalid(
                "If you want both the length and indexes, please just use IDX.".to_string(),
            ));
        }

        Ok(lcs)
    }
}
