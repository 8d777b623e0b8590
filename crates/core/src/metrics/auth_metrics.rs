use prometheus::{HistogramVec, IntCounterVec, Opts, Registry};

/// Login/session metrics. Trimmed from the teacher's `AuthMetrics`: no email,
/// password-reset, or 2FA surface exists in this service.
#[derive(Debug, Clone)]
pub struct AuthMetrics {
    pub login_attempts_total: IntCounterVec,
    pub login_success_total: IntCounterVec,
    pub login_failures_total: IntCounterVec,
    pub login_duration_seconds: HistogramVec,

    pub registration_attempts_total: IntCounterVec,
    pub registration_success_total: IntCounterVec,
    pub registration_failures_total: IntCounterVec,

    pub session_validations_total: IntCounterVec,
    pub session_validation_duration_seconds: HistogramVec,

    pub rate_limit_exceeded_total: IntCounterVec,
}

impl AuthMetrics {
    pub fn new(namespace: &str) -> Result<Self, prometheus::Error> {
        let login_attempts_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_login_attempts_total"), "Total number of login attempts"),
            &["company_id", "status"],
        )?;

        let login_success_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_login_success_total"), "Total number of successful logins"),
            &["company_id"],
        )?;

        let login_failures_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_login_failures_total"), "Total number of failed logins"),
            &["company_id", "reason"],
        )?;

        let login_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{namespace}_login_duration_seconds"),
                "Time spent processing login requests",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["company_id"],
        )?;

        let registration_attempts_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_registration_attempts_total"), "Total number of registration attempts"),
            &["status"],
        )?;

        let registration_success_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_registration_success_total"), "Total number of successful registrations"),
            &[] as &[&str],
        )?;

        let registration_failures_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_registration_failures_total"), "Total number of failed registrations"),
            &["reason"],
        )?;

        let session_validations_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_session_validations_total"), "Total number of session validations"),
            &["status"],
        )?;

        let session_validation_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{namespace}_session_validation_duration_seconds"),
                "Time spent validating sessions",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]),
            &[] as &[&str],
        )?;

        let rate_limit_exceeded_total = IntCounterVec::new(
            Opts::new(format!("{namespace}_rate_limit_exceeded_total"), "Total number of rate limit violations"),
            &["company_id", "endpoint"],
        )?;

        Ok(Self {
            login_attempts_total,
            login_success_total,
            login_failures_total,
            login_duration_seconds,
            registration_attempts_total,
            registration_success_total,
            registration_failures_total,
            session_validations_total,
            session_validation_duration_seconds,
            rate_limit_exceeded_total,
        })
    }

    pub fn register_all(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.login_attempts_total.clone()))?;
        registry.register(Box::new(self.login_success_total.clone()))?;
        registry.register(Box::new(self.login_failures_total.clone()))?;
        registry.register(Box::new(self.login_duration_seconds.clone()))?;
        registry.register(Box::new(self.registration_attempts_total.clone()))?;
        registry.register(Box::new(self.registration_success_total.clone()))?;
        registry.register(Box::new(self.registration_failures_total.clone()))?;
        registry.register(Box::new(self.session_validations_total.clone()))?;
        registry.register(Box::new(self.session_validation_duration_seconds.clone()))?;
        registry.register(Box::new(self.rate_limit_exceeded_total.clone()))?;

        Ok(())
    }
}
