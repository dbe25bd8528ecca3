//! 排序序号（urutan）相关类型

use serde::{Deserialize, Serialize};

use crate::error::Entity;

/// 带 urutan 列的表（白名单，表名不接受外部输入）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedTable {
    Category,
    Brand,
    Condition,
    PackageCondition,
    Banner,
    Faq,
    Video,
    BlogPost,
}

impl OrderedTable {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Brand => "brands",
            Self::Condition => "conditions",
            Self::PackageCondition => "package_conditions",
            Self::Banner => "banners",
            Self::Faq => "faqs",
            Self::Video => "videos",
            Self::BlogPost => "blog_posts",
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            Self::Category => Entity::Category,
            Self::Brand => Entity::Brand,
            Self::Condition => Entity::Condition,
            Self::PackageCondition => Entity::PackageCondition,
            Self::Banner => Entity::Banner,
            Self::Faq => Entity::Faq,
            Self::Video => Entity::Video,
            Self::BlogPost => Entity::BlogPost,
        }
    }

    /// 从 URL 路径段解析，如 "package-conditions"
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "categories" => Some(Self::Category),
            "brands" => Some(Self::Brand),
            "conditions" => Some(Self::Condition),
            "package-conditions" => Some(Self::PackageCondition),
            "banners" => Some(Self::Banner),
            "faqs" => Some(Self::Faq),
            "videos" => Some(Self::Video),
            "blog-posts" => Some(Self::BlogPost),
            _ => None,
        }
    }
}

/// 一行的 id 与当前序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct OrdinalSlot {
    pub id: i64,
    pub urutan: i32,
}

/// 移动指令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "position", rename_all = "snake_case")]
pub enum MoveCommand {
    Up,
    Down,
    /// 目标位置，从 1 开始
    To(i32),
}

/// 移动结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderOutcome {
    /// 是否发生了位置变化（已在边界时为 false）
    pub moved: bool,
    /// 移动后的位置（从 1 开始）
    pub position: i32,
    /// 实际写入的行数
    pub changed: usize,
}

/// 一次移动需要写回的序号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    pub outcome: ReorderOutcome,
    pub updates: Vec<OrdinalSlot>,
}

/// 计算移动方案
///
/// `slots` 须已按 (urutan, id) 排序。序号存在重复时先按当前顺序重编为 1..=n；
/// 否则沿用原有序号值（允许有间隔），只在行之间重新分配。
/// 目标 id 不存在时返回 None。
pub fn plan_reorder(slots: &[OrdinalSlot], id: i64, command: MoveCommand) -> Option<ReorderPlan> {
    let from = slots.iter().position(|s| s.id == id)?;
    let len = slots.len();

    let target = match command {
        MoveCommand::Up => from.saturating_sub(1),
        MoveCommand::Down => (from + 1).min(len - 1),
        MoveCommand::To(position) => (position.max(1) as usize).min(len) - 1,
    };

    if target == from {
        return Some(ReorderPlan {
            outcome: ReorderOutcome {
                moved: false,
                position: from as i32 + 1,
                changed: 0,
            },
            updates: Vec::new(),
        });
    }

    let strictly_increasing = slots.windows(2).all(|w| w[0].urutan < w[1].urutan);
    let values: Vec<i32> = if strictly_increasing {
        slots.iter().map(|s| s.urutan).collect()
    } else {
        (1..=len as i32).collect()
    };

    let mut order: Vec<OrdinalSlot> = slots.to_vec();
    let moving = order.remove(from);
    order.insert(target, moving);

    let updates: Vec<OrdinalSlot> = order
        .iter()
        .zip(values)
        .filter(|(slot, value)| slot.urutan != *value)
        .map(|(slot, value)| OrdinalSlot {
            id: slot.id,
            urutan: value,
        })
        .collect();

    Some(ReorderPlan {
        outcome: ReorderOutcome {
            moved: true,
            position: target as i32 + 1,
            changed: updates.len(),
        },
        updates,
    })
}
