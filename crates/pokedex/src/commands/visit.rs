//! `visit`: run a path through the route guard.

use serde::Serialize;

use pokedex_core::Navigation;

use crate::cli::VisitArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Serialize)]
struct VisitResult<'a> {
    path: &'a str,
    public: bool,
    #[serde(flatten)]
    navigation: NavigationView,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
enum NavigationView {
    Proceed,
    Redirect { to: String },
}

impl From<Navigation> for NavigationView {
    fn from(nav: Navigation) -> Self {
        match nav {
            Navigation::Proceed => Self::Proceed,
            Navigation::Redirect { to } => Self::Redirect { to },
        }
    }
}

pub async fn handle(session: &Session, args: &VisitArgs) -> Result<(), CliError> {
    let guard = session.app.guard();
    let result = VisitResult {
        path: &args.path,
        public: guard.is_public(&args.path),
        navigation: guard.check(&args.path).await.into(),
    };

    let out = output::render_single(
        session.output,
        &result,
        |r| match r.navigation {
            NavigationView::Proceed if r.public => format!("{}: public, proceed", r.path),
            NavigationView::Proceed => format!("{}: signed in, proceed", r.path),
            NavigationView::Redirect { ref to } => format!("{}: redirect to {to}", r.path),
        },
        |r| match r.navigation {
            NavigationView::Proceed => "proceed".into(),
            NavigationView::Redirect { ref to } => to.clone(),
        },
    )?;
    output::print_output(&out, session.quiet);
    Ok(())
}
