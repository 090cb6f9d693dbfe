use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

/// Fluent-based localizer with built-in resources.
pub struct FluentLoc {
    bundle: FluentBundle<FluentResource>,
}

impl FluentLoc {
    /// Create a localizer using built-in `.ftl` strings (see ../i18n).
    pub fn builtin(lang: &str) -> Self {
        let langid: LanguageIdentifier = lang.parse().unwrap_or_default();

        // Only en-GB ships today; other tags fall back to it.
        let ftl_src = include_str!("../i18n/en-GB.ftl");

        let res = FluentResource::try_new(ftl_src.to_owned()).expect("invalid FTL resource (en-GB.ftl)");

        let mut bundle = FluentBundle::new(vec![langid]);
        // Terminal output: no bidi isolation marks around placeables.
        bundle.set_use_isolating(false);
        bundle.add_resource(res).expect("failed to add FTL resource");
        Self { bundle }
    }

    /// Format a message by code with named args (("name","value"), ...).
    /// Returns the code itself if not found.
    pub fn msg(&self, code: &str, args: &[(&str, &str)]) -> String {
        let mut fa = FluentArgs::new();
        for (k, v) in args {
            fa.set(*k, FluentValue::from(*v));
        }
        self.format(code, &fa)
    }

    /// Format a message that selects on a numeric `$count`.
    pub fn count(&self, code: &str, count: usize) -> String {
        let mut fa = FluentArgs::new();
        fa.set("count", FluentValue::from(count));
        self.format(code, &fa)
    }

    fn format(&self, code: &str, args: &FluentArgs) -> String {
        let Some(msg) = self.bundle.get_message(code) else {
            return code.to_string();
        };
        let Some(pattern) = msg.value() else {
            return code.to_string();
        };

        let mut errs = vec![];
        let s = self.bundle.format_pattern(pattern, Some(args), &mut errs).to_string();

        if errs.is_empty() {
            s
        } else {
            code.to_string()
        }
    }
}
