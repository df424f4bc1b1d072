use std::sync::Mutex;

use serde_json::{Value, json};

use super::*;
use crate::messaging::DeliveryError;
use crate::settings::{MemoryStore, resolve};
use crate::theme::CatalogLoader;

#[derive(Default)]
struct Inbox(Mutex<Vec<RuntimeMessage>>);

impl Inbox {
	fn messages(&self) -> Vec<RuntimeMessage> {
		self.0.lock().expect("inbox lock").clone()
	}
}

impl MessageTarget for Inbox {
	fn send(&self, message: &RuntimeMessage) -> Result<(), DeliveryError> {
		self.0.lock().expect("inbox lock").push(message.clone());
		Ok(())
	}
}

fn store_with(value: Value) -> Arc<MemoryStore> {
	Arc::new(MemoryStore::with_record(
		serde_json::from_value(value).expect("record"),
	))
}

fn open(store: &Arc<MemoryStore>, host: Option<&str>) -> (ControlSurface, Arc<Inbox>) {
	let inbox = Arc::new(Inbox::default());
	let target: Arc<dyn MessageTarget> = inbox.clone();
	let surface = ControlSurface::open(
		store.clone(),
		CatalogLoader::builtin().load(),
		host.map(str::to_string),
		Some(target),
	)
	.expect("open");
	(surface, inbox)
}

#[test]
fn host_extraction_skips_restricted_pages() {
	assert_eq!(
		host_from_url("https://www.Example.com:8443/path?q=1#top").as_deref(),
		Some("www.example.com")
	);
	assert_eq!(
		host_from_url("http://user:pw@news.site.org/").as_deref(),
		Some("news.site.org")
	);
	assert_eq!(host_from_url("http://[::1]:8080/").as_deref(), Some("::1"));
	assert_eq!(host_from_url("chrome://settings"), None);
	assert_eq!(host_from_url("edge://flags"), None);
	assert_eq!(host_from_url("https://chrome.google.com/webstore"), None);
	assert_eq!(host_from_url("about:blank"), None);
	assert_eq!(host_from_url("file:///tmp/page.html"), None);
	assert_eq!(host_from_url("not a url"), None);
}

#[test]
fn site_scope_without_host_opens_as_global() {
	let store = store_with(json!({ "applyScope": "site" }));
	let (surface, _) = open(&store, None);
	assert_eq!(surface.scope(), ApplyScope::Global);

	let (surface, _) = open(&store, Some("x.com"));
	assert_eq!(surface.scope(), ApplyScope::Site);
}

#[test]
fn catalog_lists_favorites_first_then_by_name() {
	let store = store_with(json!({ "favorites": ["nord", "dracula"] }));
	let (surface, _) = open(&store, None);

	let names: Vec<_> = surface
		.filter_catalog("", false)
		.into_iter()
		.map(|theme| theme.name.as_str())
		.collect();
	assert_eq!(
		names,
		["Dracula", "Nord", "8008", "Carbon", "Lil Dragon", "Paper", "Serika", "Serika Dark"]
	);

	let favorites: Vec<_> = surface
		.filter_catalog("", true)
		.into_iter()
		.map(|theme| theme.id.as_str())
		.collect();
	assert_eq!(favorites, ["dracula", "nord"]);

	let matches: Vec<_> = surface
		.filter_catalog("SERIKA", false)
		.into_iter()
		.map(|theme| theme.id.as_str())
		.collect();
	assert_eq!(matches, ["serika", "serika-dark"]);
}

#[test]
fn toggling_favorite_persists_the_set() {
	let store = store_with(json!({ "favorites": ["nord"] }));
	let (mut surface, _) = open(&store, None);

	assert!(surface.toggle_favorite("paper").expect("toggle"));
	assert!(!surface.toggle_favorite("nord").expect("toggle"));
	assert_eq!(store.snapshot()["favorites"], json!(["paper"]));
}

#[test]
fn global_selection_updates_selected_theme() {
	let store = store_with(json!({}));
	let (mut surface, inbox) = open(&store, Some("x.com"));

	surface.select_theme("nord").expect("select");

	let snapshot = store.snapshot();
	assert_eq!(snapshot["selectedThemeId"], json!("nord"));
	assert_eq!(snapshot["applyScope"], json!("global"));
	assert!(snapshot.get("perHostThemes").is_none());
	assert_eq!(inbox.messages(), [RuntimeMessage::apply_theme("nord", 0.9)]);
}

#[test]
fn site_selection_writes_host_record_with_blend() {
	let store = store_with(json!({ "applyScope": "site", "blend": 0.6 }));
	let (mut surface, _) = open(&store, Some("WWW.X.com"));

	surface.select_theme("dracula").expect("select");

	let snapshot = store.snapshot();
	assert_eq!(
		snapshot["perHostThemes"],
		json!({ "x.com": { "themeId": "dracula", "blend": 0.6 } })
	);
	assert_eq!(snapshot.get("selectedThemeId"), None);
	assert!(surface.has_site_override());

	let settings = settings::load(store.as_ref()).expect("load");
	assert_eq!(resolve(&settings, Some("x.com")).theme_id, "dracula");
	assert_eq!(resolve(&settings, Some("y.com")).theme_id, "serika-dark");
}

#[test]
fn site_blend_creates_record_for_current_theme() {
	let store = store_with(json!({ "applyScope": "site", "selectedThemeId": "paper" }));
	let (mut surface, inbox) = open(&store, Some("x.com"));

	surface.update_blend(0.4).expect("blend");

	assert_eq!(
		store.snapshot()["perHostThemes"],
		json!({ "x.com": { "themeId": "paper", "blend": 0.4 } })
	);
	assert_eq!(surface.blend_label(), "40%");
	assert_eq!(inbox.messages(), [RuntimeMessage::apply_theme("paper", 0.4)]);
}

#[test]
fn global_blend_is_clamped_before_writing() {
	let store = store_with(json!({}));
	let (mut surface, _) = open(&store, None);

	surface.update_blend(3.0).expect("blend");
	assert_eq!(store.snapshot()["blend"], json!(1.0));
	assert_eq!(surface.current_blend(), 1.0);
}

#[test]
fn site_scope_needs_a_host() {
	let store = store_with(json!({}));
	let (mut surface, inbox) = open(&store, None);

	assert!(!surface.change_scope(ApplyScope::Site).expect("scope"));
	assert_eq!(surface.scope(), ApplyScope::Global);
	assert!(store.snapshot().get("applyScope").is_none());
	assert!(inbox.messages().is_empty());
}

#[test]
fn scope_change_switches_current_selection() {
	let store = store_with(json!({
		"selectedThemeId": "nord",
		"blend": 0.5,
		"perHostThemes": { "x.com": { "themeId": "carbon", "blend": 0.3 } }
	}));
	let (mut surface, _) = open(&store, Some("x.com"));
	assert_eq!(surface.current_theme_id(), "nord");

	assert!(surface.change_scope(ApplyScope::Site).expect("scope"));
	assert_eq!(surface.current_theme_id(), "carbon");
	assert_eq!(surface.current_blend(), 0.3);
	assert_eq!(store.snapshot()["applyScope"], json!("site"));

	assert!(surface.change_scope(ApplyScope::Global).expect("scope"));
	assert_eq!(surface.current_theme_id(), "nord");
	assert_eq!(surface.current_blend(), 0.5);
}

#[test]
fn clearing_site_override_falls_back_to_global() {
	let store = store_with(json!({
		"selectedThemeId": "nord",
		"applyScope": "site",
		"perHostThemes": {
			"x.com": { "themeId": "carbon" },
			"y.com": { "themeId": "paper" }
		}
	}));
	let (mut surface, _) = open(&store, Some("x.com"));
	assert_eq!(surface.current_theme_id(), "carbon");

	assert!(surface.clear_site_override().expect("clear"));
	assert_eq!(surface.current_theme_id(), "nord");
	assert!(!surface.has_site_override());
	assert_eq!(
		store.snapshot()["perHostThemes"],
		json!({ "y.com": { "themeId": "paper" } })
	);

	let (mut without_host, _) = open(&store, None);
	assert!(!without_host.clear_site_override().expect("clear"));
}
