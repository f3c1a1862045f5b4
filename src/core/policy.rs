//! 管理命令访问策略

use std::collections::HashSet;

use tracing::warn;

use crate::domain::UserId;

/// 管理员白名单
///
/// 白名单为空表示策略关闭，所有人都可以执行管理命令
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admins: HashSet<UserId>,
}

impl AccessPolicy {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// 关闭的策略，允许所有人
    pub fn disabled() -> Self {
        Self::default()
    }

    /// 解析逗号分隔的 ID 列表，非纯数字的条目会被跳过
    pub fn from_csv(raw: &str) -> Self {
        let admins = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                if !entry.bytes().all(|b| b.is_ascii_digit()) {
                    warn!(entry, "ignoring non-numeric admin id");
                    return None;
                }
                match entry.parse::<u64>() {
                    Ok(id) => Some(UserId(id)),
                    Err(e) => {
                        warn!(entry, error = %e, "ignoring out-of-range admin id");
                        None
                    }
                }
            });
        Self::new(admins)
    }

    pub fn is_authorized(&self, id: UserId) -> bool {
        self.admins.is_empty() || self.admins.contains(&id)
    }

    /// 无法识别发送者时，仅在策略关闭时放行
    pub fn is_authorized_sender(&self, id: Option<UserId>) -> bool {
        match id {
            Some(id) => self.is_authorized(id),
            None => !self.is_enabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.admins.is_empty()
    }

    /// 白名单中的管理员数量
    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }
}
