//! Postgres-backed Tenant Store (C1). Every write binds `company_id`; every read
//! carries a `company_id` filter in its `WHERE` clause — no operation here can
//! return or mutate a row belonging to a different tenant. Grounded on the
//! teacher's `erp-auth::repository`/`erp-master-data::customer::repository`
//! runtime `sqlx::query_as`/`query` style (no compile-time `query!` macros,
//! since the workspace carries no committed `.sqlx` offline cache).

use crate::error::{
    bad_credentials, camera_limit_exceeded, camera_name_taken, duplicate_email, invalid,
    suspended, Result,
};
use crate::models::{
    Camera, CameraFields, Company, CompanyStats, NewCompany, NewDetection, NewViolation, User,
};
use crate::stats::compute_trend;
use chrono::{Duration, Utc};
use sentinel_core::{CameraStatus, CompanyStatus, Error, ErrorCode, RequiredPpe, UserStatus};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TenantStore {
    pool: PgPool,
}

impl TenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts the company row and its bootstrap admin user in one transaction.
    /// `req.admin_password_hash` is already hashed by the caller (`sentinel-auth`);
    /// the store never sees a plaintext password.
    pub async fn create_company(&self, req: NewCompany) -> Result<(Uuid, String)> {
        if req.company_name.trim().is_empty() {
            return Err(invalid("company_name must not be empty"));
        }
        if !sentinel_core::utils::validate_email(&req.email) {
            return Err(invalid("email is not a valid address"));
        }

        let company_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let api_key = sentinel_core::utils::generate_api_key();
        let now = Utc::now();
        let max_cameras = req.max_cameras.unwrap_or(10).max(1);

        let mut tx = with_store_error(self.pool.begin().await)?;

        let insert_company = sqlx::query(
            r#"
            INSERT INTO companies
                (company_id, company_name, sector, contact, email, phone, address,
                 max_cameras, subscription_type, subscription_start, subscription_end,
                 status, api_key, required_ppe, created_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,'standard',$9,$10,'active',$11,$12,$13)
            "#,
        )
        .bind(company_id)
        .bind(&req.company_name)
        .bind(&req.sector)
        .bind(&req.contact)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(max_cameras)
        .bind(now)
        .bind(now + Duration::days(365))
        .bind(&api_key)
        .bind(Json(RequiredPpe::default()))
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_company {
            tx.rollback().await.ok();
            return Err(translate_conflict(e, || duplicate_email(&req.email)));
        }

        let insert_admin = sqlx::query(
            r#"
            INSERT INTO users
                (user_id, company_id, username, email, password_hash, role, permissions, status, created_at)
            VALUES ($1,$2,$3,$4,$5,'admin',$6,'active',$7)
            "#,
        )
        .bind(admin_id)
        .bind(company_id)
        .bind(&req.admin_username)
        .bind(&req.admin_email)
        .bind(&req.admin_password_hash)
        .bind(Json(sentinel_core::Role::Admin.default_permissions()))
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert_admin {
            tx.rollback().await.ok();
            return Err(translate_conflict(e, || duplicate_email(&req.admin_email)));
        }

        with_store_error(tx.commit().await)?;

        Ok((company_id, api_key))
    }

    /// Joined user+company row for the login flow. Password verification and the
    /// active/active check happen in `sentinel-auth`; this is a read only.
    pub async fn find_user_for_login(&self, email: &str) -> Result<Option<(User, Company)>> {
        let user: Option<User> = with_store_error(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await,
        )?;
        let Some(user) = user else { return Ok(None) };

        let company: Option<Company> = with_store_error(
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE company_id = $1")
                .bind(user.company_id)
                .fetch_optional(&self.pool)
                .await,
        )?;
        let Some(company) = company else { return Ok(None) };

        Ok(Some((user, company)))
    }

    /// Fails with `bad_credentials`/`suspended` if the joined rows don't check out,
    /// so callers in `sentinel-auth` can `?` straight through without re-deriving
    /// the active/active predicate themselves.
    pub async fn require_active_pair(&self, user: &User, company: &Company) -> Result<()> {
        if user.status != UserStatus::Active {
            return Err(bad_credentials());
        }
        if company.status != CompanyStatus::Active {
            return Err(suspended());
        }
        Ok(())
    }

    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<()> {
        with_store_error(
            sqlx::query("UPDATE users SET last_login = now() WHERE user_id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await,
        )?;
        Ok(())
    }

    pub async fn get_company(&self, company_id: Uuid) -> Result<Company> {
        with_store_error(
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE company_id = $1")
                .bind(company_id)
                .fetch_optional(&self.pool)
                .await,
        )?
        .ok_or_else(|| Error::not_found("company not found"))
    }

    pub async fn update_ppe_config(&self, company_id: Uuid, required_ppe: &RequiredPpe) -> Result<()> {
        let affected = with_store_error(
            sqlx::query("UPDATE companies SET required_ppe = $1 WHERE company_id = $2")
                .bind(Json(required_ppe))
                .bind(company_id)
                .execute(&self.pool)
                .await,
        )?
        .rows_affected();
        if affected == 0 {
            return Err(Error::not_found("company not found"));
        }
        Ok(())
    }

    pub async fn add_camera(&self, company_id: Uuid, fields: CameraFields) -> Result<Camera> {
        let name = fields.name.clone().ok_or_else(|| invalid("name is required"))?;
        if !sentinel_core::utils::validate_camera_name(&name) {
            return Err(invalid("name contains invalid characters"));
        }

        let company = self.get_company(company_id).await?;

        let (active_count,): (i64,) = with_store_error(
            sqlx::query_as(
                "SELECT COUNT(*) FROM cameras WHERE company_id = $1 AND status != 'deleted'",
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        if active_count >= company.max_cameras as i64 {
            return Err(camera_limit_exceeded(company.max_cameras));
        }

        let camera_id = Uuid::new_v4();
        let now = Utc::now();

        let result = sqlx::query_as::<_, Camera>(
            r#"
            INSERT INTO cameras
                (camera_id, company_id, name, location, ip_address, port, protocol,
                 stream_path, auth_type, username, password, resolution_width,
                 resolution_height, fps, status, created_at, updated_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,'discovered',$15,$15)
            RETURNING *
            "#,
        )
        .bind(camera_id)
        .bind(company_id)
        .bind(&name)
        .bind(&fields.location)
        .bind(&fields.ip_address)
        .bind(fields.port)
        .bind(fields.protocol.unwrap_or(sentinel_core::CameraProtocol::Http))
        .bind(&fields.stream_path)
        .bind(fields.auth_type.unwrap_or(sentinel_core::AuthType::None))
        .bind(&fields.username)
        .bind(&fields.password)
        .bind(fields.resolution_width)
        .bind(fields.resolution_height)
        .bind(fields.fps.unwrap_or(15))
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|e| translate_conflict(e, || camera_name_taken(&name)))
    }

    pub async fn update_camera(
        &self,
        company_id: Uuid,
        camera_id: Uuid,
        fields: CameraFields,
    ) -> Result<Camera> {
        let existing = self.get_camera(company_id, camera_id).await?;

        let name = fields.name.unwrap_or(existing.name);
        let location = fields.location.or(existing.location);
        let ip_address = fields.ip_address.or(existing.ip_address);
        let port = fields.port.or(existing.port);
        let protocol = fields.protocol.unwrap_or(existing.protocol);
        let stream_path = fields.stream_path.or(existing.stream_path);
        let auth_type = fields.auth_type.unwrap_or(existing.auth_type);
        let username = fields.username.or(existing.username);
        let password = fields.password.or(existing.password);
        let resolution_width = fields.resolution_width.or(existing.resolution_width);
        let resolution_height = fields.resolution_height.or(existing.resolution_height);
        let fps = fields.fps.unwrap_or(existing.fps);
        let status = fields.status.unwrap_or(existing.status);

        let result = sqlx::query_as::<_, Camera>(
            r#"
            UPDATE cameras SET
                name = $1, location = $2, ip_address = $3, port = $4, protocol = $5,
                stream_path = $6, auth_type = $7, username = $8, password = $9,
                resolution_width = $10, resolution_height = $11, fps = $12,
                status = $13, updated_at = now()
            WHERE company_id = $14 AND camera_id = $15
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(&location)
        .bind(&ip_address)
        .bind(port)
        .bind(protocol)
        .bind(&stream_path)
        .bind(auth_type)
        .bind(&username)
        .bind(&password)
        .bind(resolution_width)
        .bind(resolution_height)
        .bind(fps)
        .bind(status)
        .bind(company_id)
        .bind(camera_id)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|e| translate_conflict(e, || camera_name_taken(&name)))
    }

    pub async fn soft_delete_camera(&self, company_id: Uuid, camera_id: Uuid) -> Result<()> {
        let affected = with_store_error(
            sqlx::query(
                "UPDATE cameras SET status = 'deleted', updated_at = now() WHERE company_id = $1 AND camera_id = $2",
            )
            .bind(company_id)
            .bind(camera_id)
            .execute(&self.pool)
            .await,
        )?
        .rows_affected();

        if affected == 0 {
            return Err(Error::not_found("camera not found"));
        }
        Ok(())
    }

    pub async fn get_camera(&self, company_id: Uuid, camera_id: Uuid) -> Result<Camera> {
        with_store_error(
            sqlx::query_as::<_, Camera>(
                "SELECT * FROM cameras WHERE company_id = $1 AND camera_id = $2",
            )
            .bind(company_id)
            .bind(camera_id)
            .fetch_optional(&self.pool)
            .await,
        )?
        .ok_or_else(|| Error::not_found("camera not found"))
    }

    /// Excludes soft-deleted rows per §3's invariant. Live `status` overrides
    /// (e.g. a runtime attached but the row still says `discovered`) are applied
    /// by the caller in `sentinel-api`, which knows about the supervisor map;
    /// the store only ever reflects the durable desired state.
    pub async fn list_cameras(&self, company_id: Uuid) -> Result<Vec<Camera>> {
        with_store_error(
            sqlx::query_as::<_, Camera>(
                "SELECT * FROM cameras WHERE company_id = $1 AND status != 'deleted' ORDER BY created_at",
            )
            .bind(company_id)
            .fetch_all(&self.pool)
            .await,
        )
    }

    pub async fn mark_camera_status(
        &self,
        company_id: Uuid,
        camera_id: Uuid,
        status: CameraStatus,
    ) -> Result<()> {
        with_store_error(
            sqlx::query(
                "UPDATE cameras SET status = $1, updated_at = now() WHERE company_id = $2 AND camera_id = $3",
            )
            .bind(status)
            .bind(company_id)
            .bind(camera_id)
            .execute(&self.pool)
            .await,
        )?;
        Ok(())
    }

    pub async fn touch_last_detection(&self, camera_id: Uuid) -> Result<()> {
        with_store_error(
            sqlx::query("UPDATE cameras SET last_detection = now() WHERE camera_id = $1")
                .bind(camera_id)
                .execute(&self.pool)
                .await,
        )?;
        Ok(())
    }

    pub async fn record_detection(&self, row: NewDetection) -> Result<Uuid> {
        let detection_id = Uuid::new_v4();
        with_store_error(
            sqlx::query(
                r#"
                INSERT INTO detections
                    (detection_id, company_id, camera_id, total_people, compliant_people,
                     violation_people, compliance_rate, confidence_score, image_path,
                     detection_data, track_id)
                VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
                "#,
            )
            .bind(detection_id)
            .bind(row.company_id)
            .bind(row.camera_id)
            .bind(row.total_people)
            .bind(row.compliant_people)
            .bind(row.violation_people)
            .bind(row.compliance_rate)
            .bind(row.confidence_score)
            .bind(&row.image_path)
            .bind(Json(row.detection_data))
            .bind(&row.track_id)
            .execute(&self.pool)
            .await,
        )?;
        self.touch_last_detection(row.camera_id).await?;
        Ok(detection_id)
    }

    pub async fn record_violation(&self, row: NewViolation) -> Result<Uuid> {
        let violation_id = Uuid::new_v4();
        with_store_error(
            sqlx::query(
                r#"
                INSERT INTO violations
                    (violation_id, company_id, camera_id, user_id, violation_type,
                     missing_ppe, severity, penalty_amount, image_path)
                VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
                "#,
            )
            .bind(violation_id)
            .bind(row.company_id)
            .bind(row.camera_id)
            .bind(row.user_id)
            .bind(&row.violation_type)
            .bind(Json(&row.missing_ppe))
            .bind(row.severity)
            .bind(row.penalty_amount)
            .bind(&row.image_path)
            .execute(&self.pool)
            .await,
        )?;
        Ok(violation_id)
    }

    /// See `stats::compute_trend` for the percentage-vs-7-day-average formula
    /// resolving Open Question #4.
    pub async fn get_stats(&self, company_id: Uuid) -> Result<CompanyStats> {
        let (today_detections,): (i64,) = with_store_error(
            sqlx::query_as(
                "SELECT COUNT(*) FROM detections WHERE company_id = $1 AND \"timestamp\" >= date_trunc('day', now())",
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        let (today_violations,): (i64,) = with_store_error(
            sqlx::query_as(
                "SELECT COUNT(*) FROM violations WHERE company_id = $1 AND \"timestamp\" >= date_trunc('day', now())",
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        let (active_cameras,): (i64,) = with_store_error(
            sqlx::query_as(
                "SELECT COUNT(*) FROM cameras WHERE company_id = $1 AND status = 'active'",
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        let (monthly_violations,): (i64,) = with_store_error(
            sqlx::query_as(
                "SELECT COUNT(*) FROM violations WHERE company_id = $1 AND \"timestamp\" >= date_trunc('month', now())",
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        let (violations_7d,): (i64,) = with_store_error(
            sqlx::query_as(
                r#"
                SELECT COUNT(*) FROM violations
                WHERE company_id = $1
                  AND "timestamp" >= date_trunc('day', now()) - interval '7 days'
                  AND "timestamp" < date_trunc('day', now())
                "#,
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        let (detections_7d,): (i64,) = with_store_error(
            sqlx::query_as(
                r#"
                SELECT COUNT(*) FROM detections
                WHERE company_id = $1
                  AND "timestamp" >= date_trunc('day', now()) - interval '7 days'
                  AND "timestamp" < date_trunc('day', now())
                "#,
            )
            .bind(company_id)
            .fetch_one(&self.pool)
            .await,
        )?;

        Ok(CompanyStats {
            today_detections,
            today_violations,
            active_cameras,
            monthly_violations,
            violations_trend: compute_trend(today_violations, violations_7d),
            detections_trend: compute_trend(today_detections, detections_7d),
        })
    }

    /// Retried internally on transient connection failure (§4.1's failure
    /// semantics); a persistent outage surfaces as `ServiceUnavailable`.
    pub async fn health_check(&self) -> Result<()> {
        crate::retry::with_retry(|| async {
            with_store_error(sqlx::query("SELECT 1").fetch_one(&self.pool).await)?;
            Ok(())
        })
        .await
    }
}

fn with_store_error<T>(result: std::result::Result<T, sqlx::Error>) -> Result<T> {
    result.map_err(Error::from)
}

fn translate_conflict(err: sqlx::Error, on_unique_violation: impl FnOnce() -> Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return on_unique_violation();
        }
    }
    Error::from(err)
}
