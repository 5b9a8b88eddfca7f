use super::*;

use atelier_core::AppError;
use atelier_domain::{EmailAddress, Member};
use tracing::info;

impl ProfileService {
    /// Attaches a profile to a member and drops the member's cached permissions.
    pub async fn assign_profile(
        &self,
        actor: &UserIdentity,
        user_id: &str,
        profile_id: ProfileId,
    ) -> AccessResult<Member> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        self.authorization_service
            .load_profile(tenant_id, profile_id)
            .await?;
        let mut member = self
            .authorization_service
            .load_member(tenant_id, user_id)
            .await?;

        member.set_profile_id(Some(profile_id));
        self.repositories.members.save_member(member.clone()).await?;
        invalidate_after_commit(self.cache.as_ref(), tenant_id, StaleScope::Member(user_id)).await;
        info!(%tenant_id, user_id, %profile_id, actor = actor.user_id(), "profile assigned");

        Ok(member)
    }

    /// Adds a member, attaching the first profile (by name) that lists the
    /// member's job role for auto-attach.
    pub async fn onboard_member(
        &self,
        actor: &UserIdentity,
        input: OnboardMemberInput,
    ) -> AccessResult<Member> {
        self.authorization_service.require_admin(actor).await?;

        let tenant_id = actor.tenant_id();
        let user_id = input.user_id.trim();
        if self
            .repositories
            .members
            .find_member(tenant_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "member '{user_id}' already belongs to this workshop"
            ))
            .into());
        }

        let job_role = JobRole::classify(&input.job_role);
        let email = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(EmailAddress::new)
            .transpose()?;
        let display_name = match input.display_name.trim() {
            "" => user_id,
            display_name => display_name,
        };

        let profile_id = self
            .repositories
            .profiles
            .list_profiles(tenant_id)
            .await?
            .into_iter()
            .filter(|profile| profile.job_roles().contains(&job_role))
            .min_by_key(|profile| profile.name().as_str().to_lowercase())
            .map(|profile| profile.id());

        let member = Member::new(
            user_id,
            tenant_id,
            display_name,
            email,
            job_role,
            profile_id,
        )?;
        self.repositories.members.save_member(member.clone()).await?;
        invalidate_after_commit(self.cache.as_ref(), tenant_id, StaleScope::Member(user_id)).await;
        info!(
            %tenant_id,
            user_id,
            job_role = job_role.as_str(),
            profile_id = ?profile_id,
            "member onboarded"
        );

        Ok(member)
    }
}
