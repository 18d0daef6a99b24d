//! Page loaders for the server-rendered screens.
//!
//! Each loader fetches what its screen needs through a server-context
//! `ApiClient` and returns serializable props. Session preconditions are not
//! checked here; `routes::app` wraps every loader in the matching guard.
//!
//! Company-scoped screens (tickets, locations) read the selected company
//! from the `company_id` cookie and send it back to the backend in the
//! `company_id` header.

use serde::Serialize;

use crate::net::types::{Company, LocationSummary};

use super::guard::{PageContext, PageError, PageLoader, PageResult};

/// Props for screens that render without server data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoProps {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProps {
    pub company: Company,
    pub locations: Vec<LocationSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationProps {
    pub id: String,
    pub company_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketsProps {
    pub tickets: Vec<serde_json::Value>,
    /// Display name of the selected company.
    pub company: String,
}

/// Sign-in form.
pub struct SignInPage;

#[async_trait::async_trait]
impl PageLoader for SignInPage {
    type Props = NoProps;

    async fn load(&self, _ctx: &PageContext) -> Result<PageResult<NoProps>, PageError> {
        Ok(PageResult::Props(NoProps {}))
    }
}

/// Sign-up form.
pub struct SignUpPage;

#[async_trait::async_trait]
impl PageLoader for SignUpPage {
    type Props = NoProps;

    async fn load(&self, _ctx: &PageContext) -> Result<PageResult<NoProps>, PageError> {
        Ok(PageResult::Props(NoProps {}))
    }
}

/// Company listing. The list itself is fetched in-page.
pub struct CompaniesPage;

#[async_trait::async_trait]
impl PageLoader for CompaniesPage {
    type Props = NoProps;

    async fn load(&self, _ctx: &PageContext) -> Result<PageResult<NoProps>, PageError> {
        Ok(PageResult::Props(NoProps {}))
    }
}

/// One company with its locations. Opening it also makes it the selected
/// company for the scoped screens.
pub struct CompanyPage;

#[async_trait::async_trait]
impl PageLoader for CompanyPage {
    type Props = CompanyProps;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<CompanyProps>, PageError> {
        let id = ctx.param("id")?;
        let api = ctx.api()?;
        let company_path = format!("/empresas/{id}");

        let (company, locations) = tokio::try_join!(
            api.get::<Company>(&company_path),
            api.get_for_company::<Vec<LocationSummary>>("/locais", id),
        )?;

        ctx.company().select(&company.id);
        tracing::debug!(company_id = %company.id, locations = locations.len(), "company page loaded");
        Ok(PageResult::Props(CompanyProps { company, locations }))
    }
}

/// One location of the selected company.
pub struct LocationPage;

#[async_trait::async_trait]
impl PageLoader for LocationPage {
    type Props = LocationProps;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<LocationProps>, PageError> {
        let Some(company_id) = ctx.company().current() else {
            tracing::debug!("no company selected; redirecting to landing");
            return Ok(PageResult::redirect_to(&ctx.config().landing_route));
        };
        let id = ctx.param("id")?.to_owned();
        Ok(PageResult::Props(LocationProps { id, company_id }))
    }
}

/// Tickets of the selected company.
pub struct TicketsPage;

#[async_trait::async_trait]
impl PageLoader for TicketsPage {
    type Props = TicketsProps;

    async fn load(&self, ctx: &PageContext) -> Result<PageResult<TicketsProps>, PageError> {
        let Some(company_id) = ctx.company().current() else {
            tracing::debug!("no company selected; redirecting to landing");
            return Ok(PageResult::redirect_to(&ctx.config().landing_route));
        };
        let api = ctx.api()?;
        let company_path = format!("/empresas/{company_id}");

        let (company, tickets) = tokio::try_join!(
            api.get::<Company>(&company_path),
            api.get_for_company::<Vec<serde_json::Value>>("/tickets", &company_id),
        )?;

        Ok(PageResult::Props(TicketsProps { tickets, company: company.name }))
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
