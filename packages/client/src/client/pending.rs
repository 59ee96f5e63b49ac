//! Correlation of outbound requests with their acknowledgements.
//!
//! The server does not echo `msgid` on acknowledgements, so waiters are
//! keyed by the response `msgtype` and completed oldest first. A late
//! acknowledgement for a request that already timed out therefore resolves
//! the next request of the same type.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::domain::MsgType;
use crate::error::RequestError;
use crate::infrastructure::dto::Envelope;

/// A registered waiter for one acknowledgement.
///
/// Dropping the ticket removes it from the table, so an abandoned request
/// never outlives its caller.
#[derive(Debug)]
pub struct PendingTicket {
    msg_type: MsgType,
    ticket: u64,
    rx: oneshot::Receiver<Envelope>,
    table: Weak<Mutex<Waiters>>,
}

impl PendingTicket {
    pub fn msg_type(&self) -> MsgType {
        self.msg_type
    }
}

impl Drop for PendingTicket {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            lock_waiters(&table).remove(self.msg_type, self.ticket);
        }
    }
}

#[derive(Debug, Default)]
struct Waiters {
    next_ticket: u64,
    by_type: HashMap<MsgType, VecDeque<(u64, oneshot::Sender<Envelope>)>>,
}

impl Waiters {
    fn remove(&mut self, msg_type: MsgType, ticket: u64) {
        if let Some(queue) = self.by_type.get_mut(&msg_type) {
            queue.retain(|(id, _)| *id != ticket);
            if queue.is_empty() {
                self.by_type.remove(&msg_type);
            }
        }
    }
}

fn lock_waiters(table: &Mutex<Waiters>) -> MutexGuard<'_, Waiters> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Table of requests awaiting an acknowledgement.
#[derive(Debug, Default)]
pub struct PendingRequests {
    waiters: Arc<Mutex<Waiters>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Waiters> {
        lock_waiters(&self.waiters)
    }

    /// Queue a waiter for the next envelope of `msg_type`.
    pub fn register(&self, msg_type: MsgType) -> PendingTicket {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.lock();
        let ticket = waiters.next_ticket;
        waiters.next_ticket += 1;
        waiters
            .by_type
            .entry(msg_type)
            .or_default()
            .push_back((ticket, tx));
        PendingTicket {
            msg_type,
            ticket,
            rx,
            table: Arc::downgrade(&self.waiters),
        }
    }

    /// Hand `envelope` to the oldest live waiter of its type.
    ///
    /// Returns whether a waiter received it. Waiters whose receiver is gone
    /// are discarded along the way.
    pub fn complete(&self, envelope: &Envelope) -> bool {
        if !envelope.msg_type.is_response() {
            return false;
        }
        let mut waiters = self.lock();
        let Some(queue) = waiters.by_type.get_mut(&envelope.msg_type) else {
            return false;
        };

        let mut delivered = false;
        while let Some((_, tx)) = queue.pop_front() {
            if tx.send(envelope.clone()).is_ok() {
                delivered = true;
                break;
            }
        }
        if queue.is_empty() {
            waiters.by_type.remove(&envelope.msg_type);
        }
        delivered
    }

    /// Remove exactly this ticket, if it is still queued.
    pub fn cancel(&self, ticket: &PendingTicket) {
        self.lock().remove(ticket.msg_type, ticket.ticket);
    }

    /// Drop every waiter; each observes [`RequestError::Disconnected`].
    pub fn fail_all(&self) {
        let mut waiters = self.lock();
        let count: usize = waiters.by_type.values().map(VecDeque::len).sum();
        if count > 0 {
            tracing::debug!(count, "failing pending requests");
        }
        waiters.by_type.clear();
    }

    /// Number of queued waiters.
    pub fn len(&self) -> usize {
        self.lock().by_type.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for the ticket's acknowledgement for at most `timeout`.
    ///
    /// # Errors
    ///
    /// `Timeout` if nothing arrives in time (the ticket is removed), or
    /// `Disconnected` if the table was failed meanwhile.
    pub async fn wait(
        &self,
        mut ticket: PendingTicket,
        timeout: Duration,
    ) -> Result<Envelope, RequestError> {
        match tokio::time::timeout(timeout, &mut ticket.rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(RequestError::Disconnected),
            Err(_) => {
                self.cancel(&ticket);
                Err(RequestError::Timeout {
                    msg_type: ticket.msg_type,
                    after: timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack(msg_type: MsgType, error: i64) -> Envelope {
        Envelope::parse(&format!(r#"{{"msgtype":{},"error":{error}}}"#, msg_type.as_i64()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_resolves_oldest_waiter_first() {
        // テスト項目: 同じ型の待機者は登録順 (FIFO) に応答を受け取る
        // given (前提条件):
        let pending = PendingRequests::new();
        let first = pending.register(MsgType::RegisterResponse);
        let second = pending.register(MsgType::RegisterResponse);

        // when (操作):
        assert!(pending.complete(&ack(MsgType::RegisterResponse, 1)));
        assert!(pending.complete(&ack(MsgType::RegisterResponse, 0)));

        // then (期待する結果):
        let timeout = Duration::from_secs(1);
        assert_eq!(
            pending.wait(first, timeout).await.unwrap().error_code(),
            Some(1)
        );
        assert_eq!(
            pending.wait(second, timeout).await.unwrap().error_code(),
            Some(0)
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_complete_without_waiter_returns_false() {
        // テスト項目: 待機者がいない型の応答は誰にも渡されない
        let pending = PendingRequests::new();
        let _login = pending.register(MsgType::LoginResponse);

        assert!(!pending.complete(&ack(MsgType::AddFriendResponse, 0)));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_complete_skips_abandoned_waiters() {
        // テスト項目: 受信側が破棄された待機者は読み飛ばされ、次の待機者に渡される
        // given (前提条件):
        let pending = PendingRequests::new();
        let abandoned = pending.register(MsgType::LoginResponse);
        let mut live = pending.register(MsgType::LoginResponse);
        drop(abandoned);

        // when (操作):
        let delivered = pending.complete(&ack(MsgType::LoginResponse, 0));

        // then (期待する結果):
        assert!(delivered);
        assert!(live.rx.try_recv().is_ok());
        assert!(pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_removes_only_its_ticket() {
        // テスト項目: タイムアウトした待機者だけがテーブルから削除される
        // given (前提条件):
        let pending = PendingRequests::new();
        let timed_out = pending.register(MsgType::CreateGroupResponse);
        let _other = pending.register(MsgType::CreateGroupResponse);

        // when (操作):
        let result = pending
            .wait(timed_out, Duration::from_millis(100))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RequestError::Timeout {
                msg_type: MsgType::CreateGroupResponse,
                after: Duration::from_millis(100),
            })
        );
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_complete_ignores_non_acknowledgements() {
        // テスト項目: 応答以外の型 (チャットなど) は待機者に渡されない
        let pending = PendingRequests::new();
        let _login = pending.register(MsgType::LoginResponse);

        let chat = Envelope::parse(r#"{"msgtype":6,"fromid":1,"toid":2,"content":"hi"}"#).unwrap();

        assert!(!pending.complete(&chat));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_dropped_ticket_leaves_the_table() {
        // テスト項目: 破棄されたチケットはテーブルから即座に取り除かれ、他の待機者は残る
        // given (前提条件):
        let pending = PendingRequests::new();
        let dropped = pending.register(MsgType::AddFriendResponse);
        let _kept = pending.register(MsgType::AddFriendResponse);

        // when (操作):
        drop(dropped);

        // then (期待する結果):
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_wait_removes_its_ticket() {
        // テスト項目: wait の future を途中で破棄しても待機者が残らない
        // given (前提条件):
        let pending = PendingRequests::new();
        let ticket = pending.register(MsgType::LoginResponse);

        // when (操作):
        let result = tokio::time::timeout(
            Duration::from_millis(10),
            pending.wait(ticket, Duration::from_secs(10)),
        )
        .await;

        // then (期待する結果):
        assert!(result.is_err());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_fail_all_reports_disconnected() {
        // テスト項目: fail_all 後の待機者は Disconnected を受け取る
        let pending = PendingRequests::new();
        let ticket = pending.register(MsgType::AddFriendResponse);

        pending.fail_all();

        assert_eq!(
            pending.wait(ticket, Duration::from_secs(1)).await,
            Err(RequestError::Disconnected)
        );
        assert!(pending.is_empty());
    }
}
