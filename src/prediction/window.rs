//! Bounded per-service telemetry window.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Maximum number of points retained per service.
pub const MAX_POINTS: usize = 1000;

/// One telemetry sample. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    /// Response time in milliseconds.
    pub response_time: f64,
    pub success: bool,
    /// CPU usage in [0, 1].
    pub cpu_usage: f64,
    /// Memory usage in [0, 1].
    pub memory_usage: f64,
    pub active_connections: u32,
}

impl MetricPoint {
    /// A sample stamped with the current time.
    pub fn now(
        response_time: f64,
        success: bool,
        cpu_usage: f64,
        memory_usage: f64,
        active_connections: u32,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            response_time,
            success,
            cpu_usage,
            memory_usage,
            active_connections,
        }
    }
}

/// FIFO window of the most recent [`MAX_POINTS`] samples of one service.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    points: VecDeque<MetricPoint>,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            points: VecDeque::with_capacity(MAX_POINTS),
        }
    }

    /// Append a point, discarding the oldest ones beyond capacity.
    pub fn push(&mut self, point: MetricPoint) {
        self.points.push_back(point);
        while self.points.len() > MAX_POINTS {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricPoint> {
        self.points.iter()
    }

    /// Points strictly newer than `now - window`, oldest first.
    pub fn recent_points(&self, window: Duration, now: DateTime<Utc>) -> Vec<MetricPoint> {
        let cutoff = now - window;
        let mut recent: Vec<MetricPoint> = self
            .points
            .iter()
            .filter(|point| point.timestamp > cutoff)
            .copied()
            .collect();
        recent.sort_by_key(|point| point.timestamp);
        recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(timestamp: DateTime<Utc>, response_time: f64) -> MetricPoint {
        MetricPoint {
            timestamp,
            response_time,
            success: true,
            cpu_usage: 0.5,
            memory_usage: 0.5,
            active_connections: 10,
        }
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = ServiceMetrics::new();
        let now = Utc::now();
        for i in 0..2500 {
            window.push(point_at(now, i as f64));
        }
        assert_eq!(window.len(), MAX_POINTS);
        // Oldest evicted first: the survivors are the last 1000 appended.
        assert_eq!(window.iter().next().map(|p| p.response_time), Some(1500.0));
        assert_eq!(window.iter().last().map(|p| p.response_time), Some(2499.0));
    }

    #[test]
    fn test_recent_points_filters_and_orders() {
        let mut window = ServiceMetrics::new();
        let now = Utc::now();
        window.push(point_at(now - Duration::minutes(1), 2.0));
        window.push(point_at(now - Duration::minutes(11), 0.0));
        window.push(point_at(now - Duration::minutes(5), 1.0));
        window.push(point_at(now - Duration::minutes(10), 9.0));

        let recent = window.recent_points(Duration::minutes(10), now);
        let times: Vec<f64> = recent.iter().map(|p| p.response_time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
    }
}
