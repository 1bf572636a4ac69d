use std::{process, rc::Rc};

use rights_debugger::{
    application::{
        controller::{ControllerOptions, SearchFormController},
        error::AppError,
    },
    config,
    domain::criteria::SearchForm,
    infra::{http::HttpBackend, telemetry},
    presentation::{console, document::Document, terminal::TerminalView},
};
use tokio::task::LocalSet;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let search = settings.search;
    info!(
        endpoint = %search.endpoint,
        method = ?search.method,
        fields = search.fields.len(),
        "starting rights debugger console"
    );

    let backend = HttpBackend::new(search.endpoint.clone(), search.method)?;
    let controller = SearchFormController::new(
        SearchForm::new(search.fields),
        Rc::new(backend),
        TerminalView::new(Document::new()),
        ControllerOptions {
            search_timeout: search.timeout,
            revoke_timeout: settings.revoke.timeout,
            term_field: search.term_field,
        },
    );

    LocalSet::new().run_until(console::run(controller)).await
}
