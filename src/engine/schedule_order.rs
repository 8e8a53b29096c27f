// ==========================================
// 细胞培养生产排程系统 - 排程规范排序
// ==========================================
// 职责: "目标的第一条排程"与"今日排程"的唯一排序口径
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================
// 排序键:
// 1) scheduled_date 升序
// 2) scheduled_time 升序，无时刻的排在有时刻之后
// 3) created_at 升序
// 4) schedule_id 升序（仅在前三键完全相同时生效，保证全序）
// ==========================================

use crate::domain::schedule::TicketSchedule;
use chrono::NaiveTime;
use std::cmp::Ordering;

// ==========================================
// ScheduleOrder - 纯函数工具类
// ==========================================
pub struct ScheduleOrder;

impl ScheduleOrder {
    /// 比较两条排程的先后
    pub fn compare(a: &TicketSchedule, b: &TicketSchedule) -> Ordering {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| Self::compare_time(a.scheduled_time, b.scheduled_time))
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.schedule_id.cmp(&b.schedule_id))
    }

    /// 有时刻的承诺先于无时刻的同日排程
    fn compare_time(a: Option<NaiveTime>, b: Option<NaiveTime>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// 原地排序
    pub fn sort(schedules: &mut [TicketSchedule]) {
        schedules.sort_by(Self::compare);
    }

    /// 返回排序后的新列表
    pub fn sorted(mut schedules: Vec<TicketSchedule>) -> Vec<TicketSchedule> {
        Self::sort(&mut schedules);
        schedules
    }

    /// 规范顺序下的第一条
    pub fn first(schedules: &[TicketSchedule]) -> Option<&TicketSchedule> {
        schedules.iter().min_by(|a, b| Self::compare(a, b))
    }
}
