pub(super) mod api {
    use axum::Json;
    use axum::extract::State;
    use axum::extract::rejection::JsonRejection;

    use crate::subscription::{self, model::Outcome, model::Submission};

    pub async fn create(
        subscription_service: State<subscription::Service>,
        submission: Result<Json<Submission>, JsonRejection>,
    ) -> crate::Result<Outcome> {
        let Json(submission) = submission?;
        let outcome = subscription_service.relay(submission).await?;
        Ok(outcome)
    }
}
