pub(super) mod api {
    use axum::Json;
    use axum::extract::{Query, State};
    use axum::response::{IntoResponse, Redirect, Response};
    use axum_extra::extract::CookieJar;
    use axum_extra::extract::cookie::Cookie;
    use log::debug;
    use serde::Deserialize;

    use crate::Raw;
    use crate::auth::{self, Code, Csrf, state::STATE_TTL};

    const STATE_COOKIE: &str = "oauth_state";
    const STATE_COOKIE_PATH: &str = "/auth";

    pub async fn authorize(
        auth_service: State<auth::Service>,
        jar: CookieJar,
    ) -> crate::Result<impl IntoResponse> {
        let (auth_url, csrf) = auth_service.authorize().await?;
        debug!("Redirecting to provider with {csrf:?}");

        let cookie = Cookie::parse(format!(
            "{STATE_COOKIE}={}; Max-Age={}; Path={STATE_COOKIE_PATH}; HttpOnly; Secure; SameSite=Lax",
            csrf.raw(),
            STATE_TTL.as_secs()
        ))
        .map_err(|e| auth::Error::Unexpected(e.to_string()))?;

        Ok((jar.add(cookie), Redirect::to(&auth_url)))
    }

    #[derive(Deserialize)]
    pub struct Params {
        code: Option<Code>,
        state: Option<Csrf>,
        error: Option<String>,
        error_description: Option<String>,
    }

    pub async fn callback(
        Query(params): Query<Params>,
        auth_service: State<auth::Service>,
        jar: CookieJar,
    ) -> (CookieJar, Response) {
        let issued = jar.get(STATE_COOKIE).map(Csrf::from);
        let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));

        let response = exchange(params, issued, &auth_service).await.into_response();

        (jar, response)
    }

    async fn exchange(
        params: Params,
        issued: Option<Csrf>,
        auth_service: &auth::Service,
    ) -> crate::Result<Json<auth::TokenSet>> {
        if let Some(code) = params.error {
            auth_service.discard(issued).await;
            return Err(auth::Error::Provider {
                code,
                description: params.error_description,
            }
            .into());
        }

        let token = auth_service
            .exchange_code(params.code, issued, params.state)
            .await?;

        Ok(Json(token))
    }
}
