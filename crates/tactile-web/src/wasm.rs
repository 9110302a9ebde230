#![forbid(unsafe_code)]

//! `wasm-bindgen` entry point and DOM wiring. Only compiled on `wasm32`.
//!
//! All state lives in one `Rc<RefCell<App>>`. Every browser callback holds a
//! `Weak` to it and takes a short `try_borrow_mut`; a callback that would
//! re-enter is dropped and logged instead of panicking.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, HtmlElement, PointerEvent, ServiceWorker, ServiceWorkerContainer,
    ServiceWorkerRegistration, ServiceWorkerState, Window,
};

use tactile_core::error::PlatformError;
use tactile_core::haptics::{HapticBackend, HapticCapabilities, ImpactTier};
use tactile_core::update::{UpdateCommand, WorkerHost};
use tactile_core::logging::DEFAULT_LEVEL;
use tactile_core::worker::{CacheVersion, WorkerMessage};
use tactile_core::{TactileEngine, ZoneKind};
use tracing::{Level, debug, info, warn};

use crate::console::MakeConsoleWriter;
use crate::shell::{
    BANNER_ACTION_ATTR, BANNER_ACTION_SELECTOR, BANNER_ID, BannerAction, CONFIG_ELEMENT_ID,
    CONTROL_SELECTOR, Painter, VISUAL_ATTR, ZONE_ATTR, ZoneEvent, ZonePaint, load_config,
    log_level_from_query, sample_from_dom,
};

// ---------------------------------------------------------------------------
// Console and panics
// ---------------------------------------------------------------------------

fn console_call(method: &'static str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &JsValue::from_str("console")) else {
        return;
    };
    let Ok(func) = Reflect::get(&console, &JsValue::from_str(method)) else {
        return;
    };
    let Ok(func) = func.dyn_into::<Function>() else {
        return;
    };
    let _ = func.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("panic: {info}"),
            };
            console_call("error", &msg);
        }));
    });
}

fn init_logging(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(MakeConsoleWriter::new(console_call))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .try_init();
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn js_error(value: JsValue) -> PlatformError {
    PlatformError::exception(describe(&value))
}

// ---------------------------------------------------------------------------
// Haptics bridge
// ---------------------------------------------------------------------------

/// `Capacitor.Plugins.Haptics` and its `impact` function, when injected by a
/// native wrapper.
fn capacitor_impact() -> Option<(JsValue, Function)> {
    let mut node: JsValue = js_sys::global().into();
    for key in ["Capacitor", "Plugins", "Haptics"] {
        node = Reflect::get(&node, &JsValue::from_str(key))
            .ok()
            .filter(JsValue::is_object)?;
    }
    let impact = Reflect::get(&node, &JsValue::from_str("impact"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    Some((node, impact))
}

/// Rich impact through a native plugin, `navigator.vibrate` otherwise.
struct WebHaptics {
    window: Window,
}

impl HapticBackend for WebHaptics {
    fn detect(&self) -> HapticCapabilities {
        HapticCapabilities {
            impact: capacitor_impact().is_some(),
            pattern: Reflect::has(&self.window.navigator(), &JsValue::from_str("vibrate"))
                .unwrap_or(false),
        }
    }

    fn impact(&mut self, tier: ImpactTier) -> Result<(), PlatformError> {
        let Some((haptics, impact)) = capacitor_impact() else {
            return Err(PlatformError::Unavailable("Capacitor.Plugins.Haptics.impact"));
        };
        let options = Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("style"),
            &JsValue::from_str(tier.as_str()),
        )
        .map_err(js_error)?;
        let result = impact.call1(&haptics, &options).map_err(js_error)?;

        // Async rejections arrive after the fallback decision; log only.
        if let Ok(promise) = result.dyn_into::<Promise>() {
            spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    debug!(error = %describe(&err), "impact promise rejected");
                }
            });
        }
        Ok(())
    }

    fn vibrate(&mut self, pattern: &[u32]) -> Result<bool, PlatformError> {
        let array: Array = pattern.iter().map(|&ms| JsValue::from(ms)).collect();
        Ok(self.window.navigator().vibrate_with_pattern(&array))
    }
}

// ---------------------------------------------------------------------------
// Offline worker host
// ---------------------------------------------------------------------------

struct WebWorkerHost {
    app: Weak<RefCell<App>>,
    window: Window,
    registration: Option<ServiceWorkerRegistration>,
    interval_id: Option<i32>,
}

impl WorkerHost for WebWorkerHost {
    fn arm_periodic_check(&mut self, interval_secs: u32) {
        if self.interval_id.is_some() {
            return;
        }
        let app = self.app.clone();
        let tick = Closure::<dyn FnMut()>::new(move || {
            with_app(&app, |app| {
                let commands = app.engine.update_mut().periodic_check();
                app.apply(commands);
            });
        });
        let ms = i32::try_from(u64::from(interval_secs) * 1000).unwrap_or(i32::MAX);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                ms,
            ) {
            Ok(id) => {
                self.interval_id = Some(id);
                tick.forget();
            }
            Err(err) => warn!(error = %describe(&err), "could not arm update timer"),
        }
    }

    fn check_for_update(&mut self) {
        let Some(registration) = &self.registration else {
            return;
        };
        match registration.update() {
            Ok(promise) => spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    debug!(error = %describe(&err), "update check failed");
                }
            }),
            Err(err) => debug!(error = %describe(&err), "update check threw"),
        }
    }

    fn show_banner(&mut self) {
        let Some(document) = self.window.document() else {
            return;
        };
        if document.get_element_by_id(BANNER_ID).is_some() {
            return;
        }
        if let Err(err) = build_banner(&document) {
            warn!(error = %describe(&err), "could not show update banner");
        }
    }

    fn remove_banner(&mut self) {
        if let Some(banner) = self
            .window
            .document()
            .and_then(|d| d.get_element_by_id(BANNER_ID))
        {
            banner.remove();
        }
    }

    fn post_message(&mut self, message: WorkerMessage) -> Result<(), PlatformError> {
        let waiting = self
            .registration
            .as_ref()
            .and_then(ServiceWorkerRegistration::waiting)
            .ok_or(PlatformError::Unavailable("waiting worker"))?;
        let data = js_sys::JSON::parse(&message.to_json()).map_err(js_error)?;
        waiting.post_message(&data).map_err(js_error)
    }

    fn reload(&mut self) {
        if let Err(err) = self.window.location().reload() {
            warn!(error = %describe(&err), "reload failed");
        }
    }
}

/// Banner markup only. Clicks are handled by the listener from
/// [`wire_banner_actions`].
fn build_banner(document: &Document) -> Result<(), JsValue> {
    let banner = document.create_element("div")?;
    banner.set_id(BANNER_ID);
    banner.set_attribute("role", "status")?;

    let text = document.create_element("span")?;
    text.set_text_content(Some("A new version is available."));
    banner.append_child(&text)?;

    for action in BannerAction::ALL {
        let button = document.create_element("button")?;
        button.set_text_content(Some(action.label()));
        button.set_attribute(BANNER_ACTION_ATTR, action.attr_value())?;
        banner.append_child(&button)?;
    }

    document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?
        .append_child(&banner)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

struct App {
    engine: TactileEngine<WebHaptics>,
    host: WebWorkerHost,
    painter: Painter,
    zones: HashMap<ZoneKind, Element>,
}

impl App {
    fn apply(&mut self, commands: Vec<UpdateCommand>) {
        self.engine.update_mut().run(commands, &mut self.host);
    }

    fn on_pointer(
        &mut self,
        zone: ZoneKind,
        event: ZoneEvent,
        element: &Element,
        ev: &PointerEvent,
    ) {
        let pointer_id = ev.pointer_id();
        match event {
            ZoneEvent::Down | ZoneEvent::Move => {
                let rect = element.get_bounding_client_rect();
                let Some(sample) = sample_from_dom(
                    pointer_id,
                    f64::from(ev.client_x()),
                    f64::from(ev.client_y()),
                    (rect.left(), rect.top(), rect.width(), rect.height()),
                    ev.time_stamp(),
                ) else {
                    return;
                };
                if event == ZoneEvent::Move {
                    let _ = self.engine.pointer_move(zone, &sample);
                    return;
                }
                let dispatch = self.engine.pointer_down(zone, &sample);
                if !dispatch.is_ignored()
                    && zone != ZoneKind::Toggle
                    && let Err(err) = element.set_pointer_capture(pointer_id)
                {
                    debug!(error = %describe(&err), "pointer capture refused");
                }
            }
            ZoneEvent::Up => {
                if let Ok(id) = u32::try_from(pointer_id) {
                    let _ = self.engine.pointer_up(zone, id);
                }
            }
            ZoneEvent::Cancel => {
                let _ = self
                    .engine
                    .pointer_cancel(zone, u32::try_from(pointer_id).ok());
            }
        }
    }

    fn frame(&mut self) {
        let _ = self.engine.frame();
        let snapshot = self.engine.snapshot();
        for paint in self.painter.plan(&snapshot) {
            if let Some(element) = self.zones.get(&paint.zone) {
                paint_zone(element, &paint);
            }
        }
    }
}

fn with_app(app: &Weak<RefCell<App>>, f: impl FnOnce(&mut App)) {
    let Some(app) = app.upgrade() else {
        return;
    };
    let Ok(mut guard) = app.try_borrow_mut() else {
        debug!("re-entrant callback dropped");
        return;
    };
    f(&mut guard);
}

fn paint_zone(zone: &Element, paint: &ZonePaint) {
    let visual = zone
        .query_selector(&format!("[{VISUAL_ATTR}]"))
        .ok()
        .flatten()
        .unwrap_or_else(|| zone.clone());
    if let Some(html) = visual.dyn_ref::<HtmlElement>() {
        let style = html.style();
        if let Some(transform) = &paint.transform {
            let _ = style.set_property("transform", transform);
        }
        if let Some(left) = &paint.left {
            let _ = style.set_property("left", left);
        }
    }
    let classes = zone.class_list();
    for &(class, on) in &paint.classes {
        let _ = classes.toggle_with_force(class, on);
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn collect_zones(document: &Document) -> Result<HashMap<ZoneKind, Element>, JsValue> {
    let nodes = document.query_selector_all(&format!("[{ZONE_ATTR}]"))?;
    let mut zones = HashMap::new();
    for i in 0..nodes.length() {
        let Some(element) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(name) = element.get_attribute(ZONE_ATTR) else {
            continue;
        };
        match name.parse::<ZoneKind>() {
            Ok(kind) => {
                if let Some(html) = element.dyn_ref::<HtmlElement>() {
                    // Keep the browser from scrolling or zooming mid-gesture.
                    html.style().set_property("touch-action", "none")?;
                    html.style().set_property("user-select", "none")?;
                }
                zones.insert(kind, element);
            }
            Err(err) => warn!(%err, "skipping element"),
        }
    }
    Ok(zones)
}

fn wire_zone(app: &Rc<RefCell<App>>, kind: ZoneKind, element: &Element) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    let target = element.clone();
    let handler = Closure::<dyn FnMut(_)>::new(move |ev: PointerEvent| {
        let Some(event) = ZoneEvent::from_dom_name(&ev.type_()) else {
            return;
        };
        ev.prevent_default();
        with_app(&weak, |app| app.on_pointer(kind, event, &target, &ev));
    });
    for event in ZoneEvent::ALL {
        element.add_event_listener_with_callback(
            event.dom_name(),
            handler.as_ref().unchecked_ref(),
        )?;
    }
    handler.forget();
    Ok(())
}

/// One delegated listener serves every banner the session shows.
fn wire_banner_actions(app: &Rc<RefCell<App>>, document: &Document) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    let handler = Closure::<dyn FnMut(_)>::new(move |ev: web_sys::Event| {
        let Some(action) = ev
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(BANNER_ACTION_SELECTOR).ok().flatten())
            .and_then(|button| button.get_attribute(BANNER_ACTION_ATTR))
            .and_then(|value| BannerAction::from_attr(&value))
        else {
            return;
        };
        with_app(&weak, |app| {
            let commands = action.dispatch(app.engine.update_mut());
            app.apply(commands);
        });
    });
    document.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

fn request_fullscreen(document: &Document) {
    let Some(root) = document.document_element() else {
        return;
    };
    if let Err(err) = root.request_fullscreen() {
        debug!(error = %describe(&err), "fullscreen refused");
    }
}

fn wire_background(app: &Rc<RefCell<App>>, document: &Document) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    let doc = document.clone();
    let handler = Closure::<dyn FnMut(_)>::new(move |ev: PointerEvent| {
        let on_control = ev
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(CONTROL_SELECTOR).ok().flatten())
            .is_some();
        if on_control {
            return;
        }
        let mut fire = false;
        with_app(&weak, |app| fire = app.engine.background_tap(ev.time_stamp()));
        if fire {
            request_fullscreen(&doc);
        }
    });
    document.add_event_listener_with_callback("pointerdown", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

fn wire_interrupts(
    app: &Rc<RefCell<App>>,
    window: &Window,
    document: &Document,
) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    let on_blur = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        with_app(&weak, |app| {
            let _ = app.engine.interrupt();
        });
    });
    window.add_event_listener_with_callback("blur", on_blur.as_ref().unchecked_ref())?;
    on_blur.forget();

    let weak = Rc::downgrade(app);
    let doc = document.clone();
    let on_visibility = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let hidden = doc.hidden();
        with_app(&weak, |app| {
            if hidden {
                let _ = app.engine.interrupt();
            } else {
                // Styles may have been dropped while in the background.
                app.painter.invalidate();
            }
        });
    });
    document.add_event_listener_with_callback(
        "visibilitychange",
        on_visibility.as_ref().unchecked_ref(),
    )?;
    on_visibility.forget();
    Ok(())
}

fn listen(target: &web_sys::EventTarget, name: &str, mut f: impl FnMut() + 'static) {
    let handler = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| f());
    if let Err(err) =
        target.add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
    {
        warn!(error = %describe(&err), event = name, "listener not attached");
        return;
    }
    handler.forget();
}

fn watch_installing(
    app: &Weak<RefCell<App>>,
    container: &ServiceWorkerContainer,
    worker: &ServiceWorker,
) {
    let app = app.clone();
    let container = container.clone();
    let observed = worker.clone();
    listen(worker, "statechange", move || {
        if observed.state() != ServiceWorkerState::Installed {
            return;
        }
        let has_controller = container.controller().is_some();
        with_app(&app, |app| {
            let commands = app.engine.update_mut().worker_installed(has_controller);
            app.apply(commands);
        });
    });
}

fn on_registered(
    app: &Weak<RefCell<App>>,
    container: &ServiceWorkerContainer,
    registration: ServiceWorkerRegistration,
) {
    let has_controller = container.controller().is_some();
    let waiting = registration.waiting().is_some();
    let installing = registration.installing();

    {
        let app = app.clone();
        let container = container.clone();
        let observed = registration.clone();
        listen(&registration, "updatefound", move || {
            with_app(&app, |app| {
                let commands = app.engine.update_mut().update_found();
                app.apply(commands);
            });
            if let Some(worker) = observed.installing() {
                watch_installing(&app, &container, &worker);
            }
        });
    }
    if let Some(worker) = &installing {
        watch_installing(app, container, worker);
    }

    with_app(app, |app| {
        app.host.registration = Some(registration.clone());
        let commands =
            app.engine
                .update_mut()
                .registered(has_controller, waiting, installing.is_some());
        app.apply(commands);
    });
}

fn register_worker(app: &Rc<RefCell<App>>, window: &Window, url: String) {
    let weak = Rc::downgrade(app);
    let navigator = window.navigator();
    if !Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false) {
        with_app(&weak, |app| {
            let commands = app
                .engine
                .update_mut()
                .registration_failed("service workers unsupported");
            app.apply(commands);
        });
        return;
    }

    let container = navigator.service_worker();
    {
        let app = weak.clone();
        listen(&container, "controllerchange", move || {
            with_app(&app, |app| {
                let commands = app.engine.update_mut().controller_change();
                app.apply(commands);
            });
        });
    }

    spawn_local(async move {
        let registered = JsFuture::from(container.register(&url))
            .await
            .and_then(|value| value.dyn_into::<ServiceWorkerRegistration>());
        match registered {
            Ok(registration) => on_registered(&weak, &container, registration),
            Err(err) => with_app(&weak, |app| {
                let commands = app
                    .engine
                    .update_mut()
                    .registration_failed(&describe(&err));
                app.apply(commands);
            }),
        }
    });
}

fn request_frame(app: Rc<RefCell<App>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |_time: f64| {
        if let Ok(mut guard) = app.try_borrow_mut() {
            guard.frame();
        }
        request_frame(app);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Boot the page. Runs once when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    install_panic_hook();
    let Some(window) = web_sys::window() else {
        // Loaded by the offline worker for the exports below.
        init_logging(DEFAULT_LEVEL);
        return Ok(());
    };
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    init_logging(log_level_from_query(
        &window.location().search().unwrap_or_default(),
    ));

    let config_json = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.text_content());
    let config = load_config(config_json.as_deref());
    let worker_url = config.update.worker_url.clone();
    info!(cache = %CacheVersion::from_config(&config.update), "tactile starting");

    let zones = collect_zones(&document)?;
    let app = Rc::new_cyclic(|weak| {
        RefCell::new(App {
            engine: TactileEngine::new(
                config,
                WebHaptics {
                    window: window.clone(),
                },
            ),
            host: WebWorkerHost {
                app: weak.clone(),
                window: window.clone(),
                registration: None,
                interval_id: None,
            },
            painter: Painter::new(),
            zones: zones.clone(),
        })
    });

    for (kind, element) in &zones {
        wire_zone(&app, *kind, element)?;
    }
    wire_background(&app, &document)?;
    wire_banner_actions(&app, &document)?;
    wire_interrupts(&app, &window, &document)?;
    register_worker(&app, &window, worker_url);
    request_frame(app);

    info!(zones = zones.len(), "tactile started");
    Ok(())
}

// ---------------------------------------------------------------------------
// Worker-side exports
// ---------------------------------------------------------------------------

/// Whether a worker `message` event carries the skip-waiting request.
#[wasm_bindgen(js_name = isSkipWaiting)]
pub fn is_skip_waiting(data: &JsValue) -> bool {
    let Ok(json) = js_sys::JSON::stringify(data) else {
        return false;
    };
    WorkerMessage::parse(&String::from(json)) == Some(WorkerMessage::SkipWaiting)
}

/// Cache names the activating worker should delete: same prefix, any other
/// version.
#[wasm_bindgen(js_name = staleCaches)]
pub fn stale_caches(prefix: String, version: u32, existing: Vec<String>) -> Vec<String> {
    let current = CacheVersion::new(prefix, version);
    let stale: Vec<String> = current
        .stale_caches(existing.iter().map(String::as_str))
        .into_iter()
        .map(str::to_owned)
        .collect();
    if !stale.is_empty() {
        info!(current = %current, count = stale.len(), "purging stale caches");
    }
    stale
}
