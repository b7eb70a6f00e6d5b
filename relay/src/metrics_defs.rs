use shared::metrics_defs::{MetricDef, MetricType};

pub const SUBMISSIONS_RECEIVED: MetricDef = MetricDef {
    name: "submissions.received",
    metric_type: MetricType::Counter,
    description: "Number of POST requests accepted by the submission endpoint",
};

pub const SUBMISSIONS_FORWARDED: MetricDef = MetricDef {
    name: "submissions.forwarded",
    metric_type: MetricType::Counter,
    description: "Number of submissions sent to the collector. Tagged with outcome.",
};

pub const SUBMISSIONS_REJECTED: MetricDef = MetricDef {
    name: "submissions.rejected",
    metric_type: MetricType::Counter,
    description: "Number of submissions that failed before reaching the collector. Tagged with reason.",
};

pub const FORWARD_DURATION: MetricDef = MetricDef {
    name: "forward.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of the outbound collector call in seconds",
};

pub const STAGING_CLEANUP_FAILURES: MetricDef = MetricDef {
    name: "staging.cleanup_failures",
    metric_type: MetricType::Counter,
    description: "Number of staged files or directories that could not be deleted",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of submissions currently being relayed",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SUBMISSIONS_RECEIVED,
    SUBMISSIONS_FORWARDED,
    SUBMISSIONS_REJECTED,
    FORWARD_DURATION,
    STAGING_CLEANUP_FAILURES,
    REQUESTS_INFLIGHT,
];
