use async_trait::async_trait;
use atelier_application::MemberRepository;
use atelier_core::{AppError, AppResult, TenantId};
use atelier_domain::{EmailAddress, JobRole, Member, ProfileId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_columns::{map_write_error, parse_column, store_error, unsigned_column};

/// PostgreSQL-backed repository for workshop memberships.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    tenant_id: Uuid,
    user_id: String,
    display_name: String,
    email: Option<String>,
    job_role: String,
    profile_id: Option<Uuid>,
}

impl MemberRow {
    fn into_member(self) -> AppResult<Member> {
        let email = self
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|error| AppError::Internal(format!("invalid stored email: {error}")))?;

        Member::new(
            self.user_id,
            TenantId::from_uuid(self.tenant_id),
            self.display_name,
            email,
            parse_column::<JobRole>("member job role", self.job_role.as_str())?,
            self.profile_id.map(ProfileId::from_uuid),
        )
        .map_err(|error| AppError::Internal(format!("invalid stored member: {error}")))
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_member(&self, tenant_id: TenantId, user_id: &str) -> AppResult<Option<Member>> {
        sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT tenant_id, user_id, display_name, email, job_role, profile_id
            FROM access_members
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("failed to find member", error))?
        .map(MemberRow::into_member)
        .transpose()
    }

    async fn save_member(&self, member: Member) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_members (
                tenant_id,
                user_id,
                display_name,
                email,
                job_role,
                profile_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, user_id) DO UPDATE
            SET
                display_name = EXCLUDED.display_name,
                email = EXCLUDED.email,
                job_role = EXCLUDED.job_role,
                profile_id = EXCLUDED.profile_id
            "#,
        )
        .bind(member.tenant_id().as_uuid())
        .bind(member.user_id())
        .bind(member.display_name())
        .bind(member.email().map(EmailAddress::as_str))
        .bind(member.job_role().as_str())
        .bind(member.profile_id().map(|profile_id| profile_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_write_error(error, &format!("failed to save member '{}'", member.user_id()))
        })?;

        Ok(())
    }

    async fn insert_first_member(&self, member: Member) -> AppResult<bool> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("failed to begin transaction", error))?;

        // Serializes first-member inserts per workshop until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(member.tenant_id().as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to lock workshop membership", error))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO access_members (
                tenant_id,
                user_id,
                display_name,
                email,
                job_role,
                profile_id
            )
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM access_members WHERE tenant_id = $1
            )
            "#,
        )
        .bind(member.tenant_id().as_uuid())
        .bind(member.user_id())
        .bind(member.display_name())
        .bind(member.email().map(EmailAddress::as_str))
        .bind(member.job_role().as_str())
        .bind(member.profile_id().map(|profile_id| profile_id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_write_error(error, &format!("failed to insert member '{}'", member.user_id()))
        })?
        .rows_affected();

        transaction
            .commit()
            .await
            .map_err(|error| store_error("failed to commit transaction", error))?;

        Ok(inserted == 1)
    }

    async fn count_members_with_profile(
        &self,
        tenant_id: TenantId,
        profile_id: ProfileId,
    ) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM access_members
            WHERE tenant_id = $1 AND profile_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(profile_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error("failed to count profile members", error))?;

        unsigned_column("member count", count)
    }
}

#[cfg(test)]
mod tests {
    use atelier_application::{MemberRepository, ProfileRepository};
    use atelier_core::{AppError, TenantId};
    use atelier_domain::{JobRole, ProfileId};

    use super::PostgresMemberRepository;
    use crate::PostgresProfileRepository;
    use crate::test_fixtures::{member, postgres_test_pool, profile};

    #[tokio::test]
    async fn saved_member_is_replaced_and_counted_per_profile() {
        let Some(pool) = postgres_test_pool().await else {
            return;
        };

        let profiles = PostgresProfileRepository::new(pool.clone());
        let members = PostgresMemberRepository::new(pool);
        let tenant_id = TenantId::new();
        let stored = profiles
            .insert_profile(profile(tenant_id, "Mecanicos"))
            .await
            .unwrap_or_else(|_| unreachable!());

        let saved = members
            .save_member(member(tenant_id, "ana", JobRole::Technician, None))
            .await;
        assert!(saved.is_ok());
        let reassigned = members
            .save_member(member(
                tenant_id,
                "ana",
                JobRole::Technician,
                Some(stored.id()),
            ))
            .await;
        assert!(reassigned.is_ok());

        let found = members
            .find_member(tenant_id, "ana")
            .await
            .unwrap_or_else(|_| unreachable!())
            .unwrap_or_else(|| unreachable!());
        assert_eq!(found.profile_id(), Some(stored.id()));
        assert_eq!(
            found.email().map(|email| email.as_str()),
            Some("ana@oficina.com.br")
        );

        let count = members
            .count_members_with_profile(tenant_id, stored.id())
            .await;
        assert!(matches!(count, Ok(1)));

        let in_use = profiles.delete_profile(tenant_id, stored.id()).await;
        assert!(matches!(in_use, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn first_member_insert_loses_to_any_existing_member() {
        let Some(pool) = postgres_test_pool().await else {
            return;
        };

        let members = PostgresMemberRepository::new(pool);
        let tenant_id = TenantId::new();

        let (left, right) = tokio::join!(
            members.insert_first_member(member(tenant_id, "rita", JobRole::Director, None)),
            members.insert_first_member(member(tenant_id, "sergio", JobRole::Director, None)),
        );
        let left = left.unwrap_or_else(|_| unreachable!());
        let right = right.unwrap_or_else(|_| unreachable!());
        assert!(left ^ right);

        let late = members
            .insert_first_member(member(tenant_id, "tomas", JobRole::Technician, None))
            .await;
        assert!(matches!(late, Ok(false)));
        assert!(matches!(members.find_member(tenant_id, "tomas").await, Ok(None)));
    }

    #[tokio::test]
    async fn member_cannot_reference_a_missing_profile() {
        let Some(pool) = postgres_test_pool().await else {
            return;
        };

        let members = PostgresMemberRepository::new(pool);
        let result = members
            .save_member(member(
                TenantId::new(),
                "bruno",
                JobRole::Manager,
                Some(ProfileId::new()),
            ))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
