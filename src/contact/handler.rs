pub(super) mod api {
    use axum::Json;
    use axum::extract::State;
    use axum::extract::rejection::JsonRejection;

    use crate::contact::{self, model::Outcome, model::Submission};

    pub async fn create(
        contact_service: State<contact::Service>,
        submission: Result<Json<Submission>, JsonRejection>,
    ) -> crate::Result<Outcome> {
        let Json(submission) = submission?;
        let outcome = contact_service.relay(submission).await?;
        Ok(outcome)
    }
}
