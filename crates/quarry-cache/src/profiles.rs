//! Route-pattern profiles.
//!
//! Each `RouteKind` carries the framework names it answers to and the
//! globs its routing convention puts route files under. Selection is an
//! explicit match over a closed set, never a lookup by arbitrary string.

use quarry_core::{Fingerprint, RouteKind};

/// A route kind together with the detected framework that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteProfile {
    pub kind: RouteKind,
    pub framework: String,
}

impl RouteProfile {
    pub fn patterns(&self) -> &'static [&'static str] {
        route_patterns(self.kind)
    }
}

/// Framework names (lower-cased) that select a route kind exactly.
pub fn framework_names(kind: RouteKind) -> &'static [&'static str] {
    match kind {
        RouteKind::Next => &["next", "nextjs", "next.js"],
        RouteKind::Nuxt => &["nuxt", "nuxtjs", "nuxt.js"],
        RouteKind::Remix => &["remix", "@remix-run/react"],
        RouteKind::Sveltekit => &["sveltekit", "svelte-kit", "@sveltejs/kit"],
        RouteKind::Astro => &["astro"],
        RouteKind::Express => &["express", "expressjs"],
        RouteKind::Fastapi => &["fastapi"],
        RouteKind::Flask => &["flask"],
        RouteKind::Django => &["django"],
        RouteKind::Gin => &["gin", "gin-gonic"],
    }
}

/// Globs, relative to the worktree, where route files live.
pub fn route_patterns(kind: RouteKind) -> &'static [&'static str] {
    match kind {
        RouteKind::Next => &[
            "app/**/page.{tsx,jsx,ts,js}",
            "app/**/route.{ts,js}",
            "src/app/**/page.{tsx,jsx,ts,js}",
            "src/app/**/route.{ts,js}",
            "pages/**/*.{tsx,jsx,ts,js}",
            "src/pages/**/*.{tsx,jsx,ts,js}",
        ],
        RouteKind::Nuxt => &[
            "pages/**/*.vue",
            "server/api/**/*.{ts,js}",
            "server/routes/**/*.{ts,js}",
        ],
        RouteKind::Remix => &["app/routes/**/*.{tsx,jsx,ts,js}"],
        RouteKind::Sveltekit => &[
            "src/routes/**/+page.svelte",
            "src/routes/**/+page.{ts,js}",
            "src/routes/**/+server.{ts,js}",
        ],
        RouteKind::Astro => &["src/pages/**/*.{astro,md,mdx,ts,js}"],
        RouteKind::Express => &[
            "routes/**/*.{ts,js}",
            "src/routes/**/*.{ts,js}",
            "api/**/*.{ts,js}",
            "src/api/**/*.{ts,js}",
        ],
        RouteKind::Fastapi => &["**/routers/**/*.py", "**/routes/**/*.py", "**/api/**/*.py"],
        RouteKind::Flask => &["**/routes.py", "**/views.py", "**/blueprints/**/*.py"],
        RouteKind::Django => &["**/urls.py", "**/views.py"],
        RouteKind::Gin => &["**/routes/**/*.go", "**/handlers/**/*.go", "**/router.go"],
    }
}

/// Exact match of one framework name against the table.
pub fn match_framework(name: &str) -> Option<RouteKind> {
    let name = name.to_lowercase();
    RouteKind::ALL
        .into_iter()
        .find(|kind| framework_names(*kind).contains(&name.as_str()))
}

/// Picks the route profile for a fingerprint.
///
/// Exact framework names win. Failing that, the first kind whose name
/// appears inside a detected framework name (`next` in `next.js 14`).
pub fn select_profile(fingerprint: &Fingerprint) -> Option<RouteProfile> {
    for framework in &fingerprint.frameworks {
        if let Some(kind) = match_framework(&framework.name) {
            return Some(RouteProfile {
                kind,
                framework: framework.name.clone(),
            });
        }
    }

    for framework in &fingerprint.frameworks {
        let lower = framework.name.to_lowercase();
        if let Some(kind) = RouteKind::ALL.into_iter().find(|k| lower.contains(k.name())) {
            return Some(RouteProfile {
                kind,
                framework: framework.name.clone(),
            });
        }
    }

    None
}
