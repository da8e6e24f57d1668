//! 会话存储与页面状态机
//!
//! 控制器持有唯一的 SessionStore：wizard_id、当前页、面板句柄。
//! 状态：Closed -> Open(1) -> Open(n) -> Closed；每次迁移返回需要上报的 ActionEvent。
//! 锁只在同步方法内短暂持有，不跨 await；清空是同步的，保证先于面板销毁发生。

use std::sync::{Arc, Mutex, MutexGuard};

use crate::host::Panel;
use crate::telemetry::{ActionEvent, ActionKind};

/// 打开会话后的首页
pub const FIRST_PAGE: u32 = 1;

/// 当前活动会话
pub struct ActiveSession {
    pub wizard_id: String,
    /// 最近一次跳转的目标页
    pub current_page: Option<u32>,
    pub panel: Arc<dyn Panel>,
}

/// 单会话存储（同一时刻至多一个会话）
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<Option<ActiveSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn wizard_id(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.wizard_id.clone())
    }

    pub fn current_page(&self) -> Option<u32> {
        self.lock().as_ref().and_then(|s| s.current_page)
    }

    pub fn panel(&self) -> Option<Arc<dyn Panel>> {
        self.lock().as_ref().map(|s| s.panel.clone())
    }

    /// Closed -> Open(1)：以给定 wizard_id 开始会话并返回 OPEN 事件
    ///
    /// 已有会话时不替换，返回 Err(现有面板) 供调用方前置显示。
    pub fn begin(&self, wizard_id: String, panel: Arc<dyn Panel>) -> Result<ActionEvent, Arc<dyn Panel>> {
        let mut guard = self.lock();
        if let Some(existing) = guard.as_ref() {
            return Err(existing.panel.clone());
        }
        *guard = Some(ActiveSession {
            wizard_id: wizard_id.clone(),
            current_page: Some(FIRST_PAGE),
            panel,
        });
        Ok(ActionEvent {
            wizard_id,
            action: ActionKind::Open,
            from_page: None,
            to_page: Some(FIRST_PAGE),
        })
    }

    /// Open(a) -> Open(b)：记录跳转前的页为 from_page；无会话时返回 None
    pub fn transition(&self, to_page: u32) -> Option<ActionEvent> {
        let mut guard = self.lock();
        let session = guard.as_mut()?;
        let from_page = session.current_page.replace(to_page);
        Some(ActionEvent {
            wizard_id: session.wizard_id.clone(),
            action: ActionKind::Transition,
            from_page,
            to_page: Some(to_page),
        })
    }

    /// Open(*) -> Closed：同步取出并清空会话，返回关闭事件与面板句柄
    ///
    /// 会话已被清空时返回 None，后续的销毁回调因此不会重复上报。
    pub fn close(&self, action: ActionKind) -> Option<(ActionEvent, Arc<dyn Panel>)> {
        let session = self.clear()?;
        let event = ActionEvent {
            wizard_id: session.wizard_id,
            action,
            from_page: session.current_page,
            to_page: None,
        };
        Some((event, session.panel))
    }

    /// 仅当活动会话的 wizard_id 匹配时关闭；旧面板迟到的销毁回调不会关闭新会话
    pub fn close_matching(
        &self,
        wizard_id: &str,
        action: ActionKind,
    ) -> Option<(ActionEvent, Arc<dyn Panel>)> {
        let session = {
            let mut guard = self.lock();
            if guard.as_ref().map(|s| s.wizard_id.as_str()) != Some(wizard_id) {
                return None;
            }
            guard.take()?
        };
        let event = ActionEvent {
            wizard_id: session.wizard_id,
            action,
            from_page: session.current_page,
            to_page: None,
        };
        Some((event, session.panel))
    }

    /// wizard_id 仍是当前活动会话时返回其面板
    pub fn panel_for(&self, wizard_id: &str) -> Option<Arc<dyn Panel>> {
        self.lock()
            .as_ref()
            .filter(|s| s.wizard_id == wizard_id)
            .map(|s| s.panel.clone())
    }

    pub fn clear(&self) -> Option<ActiveSession> {
        self.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OutboundMessage;

    struct NullPanel;

    impl Panel for NullPanel {
        fn post_message(&self, _message: OutboundMessage) {}
        fn reveal(&self) {}
        fn dispose(&self) {}
    }

    fn panel() -> Arc<dyn Panel> {
        Arc::new(NullPanel)
    }

    #[test]
    fn test_begin_opens_first_page() {
        let store = SessionStore::new();
        assert!(!store.is_active());

        let event = store.begin("w1".into(), panel()).ok().unwrap();
        assert_eq!(event.wizard_id, "w1");
        assert_eq!(event.action, ActionKind::Open);
        assert_eq!(event.from_page, None);
        assert_eq!(event.to_page, Some(1));
        assert_eq!(store.wizard_id(), Some(event.wizard_id));
        assert_eq!(store.current_page(), Some(1));
    }

    #[test]
    fn test_begin_while_active_keeps_session() {
        let store = SessionStore::new();
        store.begin("w1".into(), panel()).ok().unwrap();
        let id = store.wizard_id();

        assert!(store.begin("w2".into(), panel()).is_err());
        assert_eq!(store.wizard_id(), id);
    }

    #[test]
    fn test_transition_records_previous_page() {
        let store = SessionStore::new();
        store.begin("w1".into(), panel()).ok().unwrap();

        let e = store.transition(2).unwrap();
        assert_eq!((e.from_page, e.to_page), (Some(1), Some(2)));
        let e = store.transition(3).unwrap();
        assert_eq!((e.from_page, e.to_page), (Some(2), Some(3)));
        assert_eq!(e.action, ActionKind::Transition);
    }

    #[test]
    fn test_transition_without_session() {
        let store = SessionStore::new();
        assert!(store.transition(2).is_none());
    }

    #[test]
    fn test_close_clears_once() {
        let store = SessionStore::new();
        store.begin("w1".into(), panel()).ok().unwrap();
        store.transition(3);

        let (event, _) = store.close(ActionKind::CloseAccept).unwrap();
        assert_eq!(event.action, ActionKind::CloseAccept);
        assert_eq!(event.from_page, Some(3));
        assert_eq!(event.to_page, None);
        assert!(!store.is_active());

        assert!(store.close(ActionKind::CloseCancel).is_none());
    }

    #[test]
    fn test_close_matching_ignores_stale_id() {
        let store = SessionStore::new();
        store.begin("w2".into(), panel()).ok().unwrap();

        assert!(store.close_matching("w1", ActionKind::CloseCancel).is_none());
        assert!(store.panel_for("w2").is_some());
        assert!(store.panel_for("w1").is_none());

        let (event, _) = store.close_matching("w2", ActionKind::CloseCancel).unwrap();
        assert_eq!(event.wizard_id, "w2");
        assert!(store.panel_for("w2").is_none());
    }
}
