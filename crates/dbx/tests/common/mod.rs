//! Scripted executor shared by the integration tests.
//!
//! Every statement is recorded; reads and writes pop queued results and fall
//! back to an empty result set / zero outcome when the queue runs dry.

#![allow(dead_code)]

use dbx::{
    Begin, DbxError, DbxResult, ExecOutcome, Executor, ResultSet, Transaction, TransactionOptions,
    Value,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    reads: VecDeque<DbxResult<ResultSet>>,
    writes: VecDeque<DbxResult<ExecOutcome>>,
    begins: Vec<TransactionOptions>,
    fail_rollback: bool,
}

#[derive(Clone, Default)]
pub struct Scripted {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_read(&self, rs: ResultSet) -> &Self {
        self.script.lock().unwrap().reads.push_back(Ok(rs));
        self
    }

    pub fn push_write(&self, rows_affected: u64, last_insert_id: Option<u64>) -> &Self {
        self.script.lock().unwrap().writes.push_back(Ok(ExecOutcome {
            rows_affected,
            last_insert_id,
        }));
        self
    }

    pub fn fail_next_write(&self, message: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .writes
            .push_back(Err(DbxError::statement(message)));
        self
    }

    pub fn fail_rollback(&self) -> &Self {
        self.script.lock().unwrap().fail_rollback = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Options of every transaction begun so far.
    pub fn begins(&self) -> Vec<TransactionOptions> {
        self.script.lock().unwrap().begins.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.sql).collect()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.script.lock().unwrap().calls.push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Executor for Scripted {
    async fn fetch(&self, sql: &str, params: &[Value]) -> DbxResult<ResultSet> {
        self.record(sql, params);
        self.pause().await;
        let next = self.script.lock().unwrap().reads.pop_front();
        next.unwrap_or_else(|| Ok(ResultSet::default()))
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> DbxResult<ExecOutcome> {
        self.record(sql, params);
        self.pause().await;
        let next = self.script.lock().unwrap().writes.pop_front();
        next.unwrap_or_else(|| Ok(ExecOutcome::default()))
    }
}

/// Transaction over the same script; BEGIN/COMMIT/ROLLBACK show up as calls.
pub struct ScriptedTx(Scripted);

impl Executor for ScriptedTx {
    async fn fetch(&self, sql: &str, params: &[Value]) -> DbxResult<ResultSet> {
        self.0.fetch(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> DbxResult<ExecOutcome> {
        self.0.execute(sql, params).await
    }
}

impl Begin for Scripted {
    type Tx = ScriptedTx;

    async fn begin_with(&self, options: TransactionOptions) -> DbxResult<ScriptedTx> {
        self.record("BEGIN", &[]);
        self.script.lock().unwrap().begins.push(options);
        Ok(ScriptedTx(self.clone()))
    }
}

impl Transaction for ScriptedTx {
    async fn commit(self) -> DbxResult<()> {
        self.0.record("COMMIT", &[]);
        Ok(())
    }

    async fn rollback(self) -> DbxResult<()> {
        self.0.record("ROLLBACK", &[]);
        if self.0.script.lock().unwrap().fail_rollback {
            return Err(DbxError::statement("connection lost"));
        }
        Ok(())
    }
}
