pub(super) mod api {
    use axum::Json;
    use axum::extract::State;
    use axum::extract::rejection::JsonRejection;

    use crate::command::{self, model::Command, model::Relayed};

    pub async fn execute(
        command_service: State<command::Service>,
        command: Result<Json<Command>, JsonRejection>,
    ) -> crate::Result<Json<Relayed>> {
        let Json(command) = command?;

        let curl = command
            .curl
            .filter(|c| !c.trim().is_empty())
            .ok_or(command::Error::MissingCommand)?;

        let relayed = command_service.execute(&curl).await?;
        Ok(Json(relayed))
    }
}
