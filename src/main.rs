use std::process;

use sanluis_blog::{
    application::{blog::BlogService, error::AppError},
    config::{self, ListArgs, Settings, ShowArgs},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        store, telemetry,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
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

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::validation(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let blog = build_blog_service(&settings)?;

    match command {
        config::Command::Serve(_) => run_serve(&settings, blog).await,
        config::Command::List(args) => run_list(blog, args).await,
        config::Command::Show(args) => run_show(blog, args).await,
    }
}

fn build_blog_service(settings: &Settings) -> Result<BlogService, AppError> {
    let store = store::connect(&settings.store)?;
    Ok(BlogService::new(store).with_collection(settings.store.collection.clone()))
}

async fn run_serve(settings: &Settings, blog: BlogService) -> Result<(), AppError> {
    let router = http::build_router(HttpState::new(blog));

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "sanluis::http",
        addr = %settings.server.addr,
        backend = settings.store.backend.name(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn run_list(blog: BlogService, args: ListArgs) -> Result<(), AppError> {
    let posts = blog.try_list_published().await?;

    match args.locale {
        Some(locale) => print_json(
            &posts
                .into_iter()
                .map(|post| post.into_localized(locale))
                .collect::<Vec<_>>(),
        ),
        None => print_json(&posts),
    }
}

async fn run_show(blog: BlogService, args: ShowArgs) -> Result<(), AppError> {
    let post = blog
        .try_get_by_slug(&args.slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post `{}`", args.slug)))?;

    match args.locale {
        Some(locale) => print_json(&post.into_localized(locale)),
        None => print_json(&post),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
