//! Widgets and their lifecycle.
//!
//! A [`Widget`] is a plain value describing replacement content. Its
//! [`WidgetId`] is the only thing reconciliation compares: when the next
//! decoration set carries a widget with the same id as a mounted one, the
//! mounted DOM is kept; otherwise the old DOM is destroyed and a new one is
//! built. DOM construction is deferred until [`WidgetManager::reconcile`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use smol_str::{SmolStr, format_smolstr};

use crate::config::ExtensionConfig;
use crate::decoration::DecorationSet;
use crate::ext::code::language_icon;
use crate::platform::Platform;
use crate::render::Renderers;
use crate::types::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSyntax {
    /// GitHub-style `| a | b |` rows with a delimiter row.
    Pipe,
    /// `:::table` ... `:::` blocks.
    Directive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Image,
    /// Image preview whose position the overlay follows.
    TrackedImage,
    InlineMath,
    DisplayMath,
    Table(TableSyntax),
    CodeHeader,
    Checkbox,
    HorizontalRule,
}

/// Reuse key for widget DOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetId {
    pub kind: WidgetKind,
    pub key: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Image {
        src: SmolStr,
        tracking: bool,
    },
    Math {
        /// Whitespace-normalized source.
        expr: SmolStr,
        display: bool,
    },
    Table {
        source: SmolStr,
        syntax: TableSyntax,
    },
    CodeHeader {
        language: SmolStr,
        code: SmolStr,
    },
    Checkbox {
        from: usize,
        to: usize,
        checked: bool,
    },
    HorizontalRule,
}

impl Widget {
    pub fn math(expr: &str, display: bool) -> Self {
        Widget::Math {
            expr: normalize_expr(expr),
            display,
        }
    }

    pub fn id(&self) -> WidgetId {
        let (kind, key) = match self {
            Widget::Image { src, tracking } => {
                let kind = if *tracking {
                    WidgetKind::TrackedImage
                } else {
                    WidgetKind::Image
                };
                (kind, src.clone())
            }
            Widget::Math { expr, display } => {
                let kind = if *display {
                    WidgetKind::DisplayMath
                } else {
                    WidgetKind::InlineMath
                };
                (kind, expr.clone())
            }
            Widget::Table { source, syntax } => (WidgetKind::Table(*syntax), source.clone()),
            Widget::CodeHeader { language, code } => (
                WidgetKind::CodeHeader,
                format_smolstr!("{language}\u{0}{code}"),
            ),
            Widget::Checkbox { from, to, checked } => (
                WidgetKind::Checkbox,
                format_smolstr!("{from}-{to}:{checked}"),
            ),
            Widget::HorizontalRule => (WidgetKind::HorizontalRule, SmolStr::default()),
        };
        WidgetId { kind, key }
    }
}

/// Collapse whitespace runs so formatting-only edits keep the same key.
pub fn normalize_expr(expr: &str) -> SmolStr {
    let mut out = String::with_capacity(expr.len());
    for word in expr.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    SmolStr::new(out)
}

#[derive(Debug)]
pub struct DomElement {
    id: u64,
    tag: &'static str,
    class: SmolStr,
    html: String,
    attrs: Vec<(SmolStr, SmolStr)>,
    alive: bool,
    revision: u64,
}

/// Shared handle to a widget's DOM node. Clones point at the same node.
#[derive(Debug, Clone)]
pub struct DomHandle(Rc<RefCell<DomElement>>);

#[derive(Debug, Clone)]
pub struct WeakDom(Weak<RefCell<DomElement>>);

impl WeakDom {
    pub fn upgrade(&self) -> Option<DomHandle> {
        self.0.upgrade().map(DomHandle)
    }
}

impl DomHandle {
    fn new(id: u64, tag: &'static str, class: impl Into<SmolStr>) -> Self {
        DomHandle(Rc::new(RefCell::new(DomElement {
            id,
            tag,
            class: class.into(),
            html: String::new(),
            attrs: Vec::new(),
            alive: true,
            revision: 0,
        })))
    }

    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    pub fn tag(&self) -> &'static str {
        self.0.borrow().tag
    }

    pub fn class(&self) -> SmolStr {
        self.0.borrow().class.clone()
    }

    pub fn inner_html(&self) -> String {
        self.0.borrow().html.clone()
    }

    pub fn attr(&self, name: &str) -> Option<SmolStr> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    pub fn is_alive(&self) -> bool {
        self.0.borrow().alive
    }

    /// Same underlying node, not just equal content.
    pub fn same_node(&self, other: &DomHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakDom {
        WeakDom(Rc::downgrade(&self.0))
    }

    fn set_html(&self, html: String) {
        self.0.borrow_mut().html = html;
    }

    fn set_attr(&self, name: &str, value: impl Into<SmolStr>) {
        let mut el = self.0.borrow_mut();
        let value = value.into();
        match el.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => el.attrs.push((SmolStr::new(name), value)),
        }
    }

    fn revision(&self) -> u64 {
        self.0.borrow().revision
    }

    fn bump_revision(&self) -> u64 {
        let mut el = self.0.borrow_mut();
        el.revision += 1;
        el.revision
    }

    /// Mark the node destroyed. Returns false if it already was.
    fn kill(&self) -> bool {
        std::mem::replace(&mut self.0.borrow_mut().alive, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type LayoutCallback = Rc<dyn Fn(Rect)>;

#[derive(Default)]
struct ObserverRegistry {
    next: u64,
    entries: Vec<(ObserverId, u64, LayoutCallback)>,
}

/// Resize/scroll callbacks keyed by DOM node.
///
/// The host calls [`notify`](Self::notify) when a node's box moves.
#[derive(Clone, Default)]
pub struct LayoutObservers(Rc<RefCell<ObserverRegistry>>);

impl LayoutObservers {
    pub fn observe(&self, dom_id: u64, callback: impl Fn(Rect) + 'static) -> ObserverId {
        let mut reg = self.0.borrow_mut();
        reg.next += 1;
        let id = ObserverId(reg.next);
        reg.entries.push((id, dom_id, Rc::new(callback)));
        id
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut reg = self.0.borrow_mut();
        let before = reg.entries.len();
        reg.entries.retain(|(entry, _, _)| *entry != id);
        reg.entries.len() != before
    }

    /// Run the callbacks observing `dom_id`, returning how many ran.
    pub fn notify(&self, dom_id: u64, rect: Rect) -> usize {
        let callbacks: Vec<LayoutCallback> = self
            .0
            .borrow()
            .entries
            .iter()
            .filter(|(_, dom, _)| *dom == dom_id)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in &callbacks {
            cb(rect);
        }
        callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for LayoutObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutObservers")
            .field("len", &self.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Pending,
    Found,
    Missing,
}

#[derive(Debug)]
struct CacheEntry {
    status: ImageStatus,
    waiters: Vec<WeakDom>,
}

/// Existence results per image source, shared by every image widget.
#[derive(Debug, Clone, Default)]
pub struct ImageCache(Rc<RefCell<HashMap<SmolStr, CacheEntry>>>);

impl ImageCache {
    pub fn status(&self, src: &str) -> Option<ImageStatus> {
        self.0.borrow().get(src).map(|e| e.status)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Look up `src`, queueing `dom` for an upgrade if the answer is not in
    /// yet. The bool is true when the caller should start the check.
    fn lookup(&self, src: &str, dom: &DomHandle) -> (ImageStatus, bool) {
        let mut entries = self.0.borrow_mut();
        match entries.get_mut(src) {
            Some(entry) => {
                if entry.status == ImageStatus::Pending {
                    entry.waiters.push(dom.downgrade());
                }
                (entry.status, false)
            }
            None => {
                entries.insert(
                    SmolStr::new(src),
                    CacheEntry {
                        status: ImageStatus::Pending,
                        waiters: vec![dom.downgrade()],
                    },
                );
                (ImageStatus::Pending, true)
            }
        }
    }

    /// Record a finished check and upgrade the widgets still alive.
    fn resolve(&self, src: &str, found: bool, found_html: &str) -> usize {
        let waiters = {
            let mut entries = self.0.borrow_mut();
            let Some(entry) = entries.get_mut(src) else {
                return 0;
            };
            entry.status = if found {
                ImageStatus::Found
            } else {
                ImageStatus::Missing
            };
            std::mem::take(&mut entry.waiters)
        };
        if !found {
            return 0;
        }
        let mut upgraded = 0;
        for waiter in waiters {
            match waiter.upgrade() {
                Some(dom) if dom.is_alive() => {
                    dom.set_html(found_html.to_string());
                    upgraded += 1;
                }
                _ => {
                    tracing::trace!(target: "scrivo::widget", %src, "image widget gone before check finished");
                }
            }
        }
        upgraded
    }
}

/// Everything widget construction needs from the outside.
#[derive(Clone)]
pub struct WidgetEnv {
    pub platform: Platform,
    pub renderers: Renderers,
    pub config: ExtensionConfig,
    pub observers: LayoutObservers,
    pub images: ImageCache,
    /// Receives the screen box of the tracked image preview.
    pub anchor: Option<Rc<dyn Fn(Rect)>>,
}

#[derive(Debug)]
pub struct MountedWidget {
    pub id: WidgetId,
    pub widget: Widget,
    pub dom: DomHandle,
    observer: Option<ObserverId>,
}

/// A widget decoration with its DOM, as handed to the host.
#[derive(Debug, Clone)]
pub struct Materialized {
    pub from: usize,
    pub to: usize,
    pub id: WidgetId,
    pub dom: DomHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetStats {
    pub created: u64,
    pub destroyed: u64,
}

pub struct WidgetManager {
    env: WidgetEnv,
    mounted: Vec<MountedWidget>,
    next_dom: u64,
    stats: WidgetStats,
}

impl WidgetManager {
    pub fn new(env: WidgetEnv) -> Self {
        Self {
            env,
            mounted: Vec::new(),
            next_dom: 0,
            stats: WidgetStats::default(),
        }
    }

    pub fn stats(&self) -> WidgetStats {
        self.stats
    }

    pub fn mounted(&self) -> &[MountedWidget] {
        &self.mounted
    }

    pub fn observers(&self) -> &LayoutObservers {
        &self.env.observers
    }

    pub fn images(&self) -> &ImageCache {
        &self.env.images
    }

    /// Bring mounted DOM in line with `set`, reusing nodes whose widget id
    /// reappears. Returns one entry per widget decoration, in order.
    pub fn reconcile(&mut self, set: &DecorationSet) -> Vec<Materialized> {
        let mut previous: Vec<Option<MountedWidget>> =
            std::mem::take(&mut self.mounted).into_iter().map(Some).collect();
        let mut next = Vec::with_capacity(previous.len());
        let mut out = Vec::new();

        for (deco, widget) in set.widgets() {
            let id = widget.id();
            let reused = previous
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|m| m.id == id))
                .and_then(Option::take);
            let mounted = match reused {
                Some(mut mounted) => {
                    mounted.widget = widget.clone();
                    mounted
                }
                None => self.create(id, widget),
            };
            out.push(Materialized {
                from: deco.from,
                to: deco.to,
                id: mounted.id.clone(),
                dom: mounted.dom.clone(),
            });
            next.push(mounted);
        }

        for stale in previous.into_iter().flatten() {
            self.destroy(stale);
        }
        self.mounted = next;
        tracing::trace!(
            target: "scrivo::widget",
            mounted = self.mounted.len(),
            created = self.stats.created,
            destroyed = self.stats.destroyed,
            "reconciled widgets"
        );
        out
    }

    pub fn destroy_all(&mut self) {
        for mounted in std::mem::take(&mut self.mounted) {
            self.destroy(mounted);
        }
    }

    fn destroy(&mut self, mounted: MountedWidget) {
        if !mounted.dom.kill() {
            tracing::warn!(target: "scrivo::widget", id = ?mounted.id, "widget destroyed twice");
            return;
        }
        if let Some(observer) = mounted.observer {
            self.env.observers.unobserve(observer);
        }
        self.stats.destroyed += 1;
    }

    fn create(&mut self, id: WidgetId, widget: &Widget) -> MountedWidget {
        self.next_dom += 1;
        let dom_id = self.next_dom;
        let mut observer = None;

        let dom = match widget {
            Widget::Image { src, tracking } => {
                let class = if *tracking {
                    "md-image md-image-preview md-image-tracking"
                } else {
                    "md-image"
                };
                let dom = DomHandle::new(dom_id, "span", class);
                self.load_image(&dom, src);
                if *tracking {
                    let anchor = self.env.anchor.clone();
                    observer = Some(self.env.observers.observe(dom_id, move |rect| {
                        if let Some(anchor) = &anchor {
                            anchor(rect);
                        }
                    }));
                }
                dom
            }
            Widget::Math { expr, display } => {
                let (tag, class) = if *display {
                    ("div", "md-math md-math-display")
                } else {
                    ("span", "md-math md-math-inline")
                };
                let dom = DomHandle::new(dom_id, tag, class);
                dom.set_html(self.env.renderers.math.render_math(expr, *display));
                dom
            }
            Widget::Table { source, syntax } => {
                let dom = DomHandle::new(dom_id, "div", "md-table-widget");
                dom.set_html(self.env.renderers.tables.render_table(source, *syntax));
                dom
            }
            Widget::CodeHeader { language, .. } => {
                let dom = DomHandle::new(dom_id, "div", "md-code-header");
                let label = if language.is_empty() {
                    "text"
                } else {
                    language.as_str()
                };
                dom.set_html(format!(
                    "<span class=\"md-code-lang\" data-icon=\"{}\">{}</span>\
                     <button class=\"md-code-copy\"></button>",
                    language_icon(language),
                    scrivo_renderer::escape_text(label),
                ));
                dom.set_attr("data-copy-icon", "copy");
                dom
            }
            Widget::Checkbox { from, to, checked } => {
                let dom = DomHandle::new(dom_id, "input", "md-task-checkbox");
                dom.set_attr("type", "checkbox");
                dom.set_attr("data-from", format_smolstr!("{from}"));
                dom.set_attr("data-to", format_smolstr!("{to}"));
                if *checked {
                    dom.set_attr("checked", "");
                }
                dom
            }
            Widget::HorizontalRule => DomHandle::new(dom_id, "hr", "md-hr"),
        };

        self.stats.created += 1;
        MountedWidget {
            id,
            widget: widget.clone(),
            dom,
            observer,
        }
    }

    fn load_image(&self, dom: &DomHandle, src: &str) {
        dom.set_html(missing_image_html(src));
        if !self.env.config.accepts_image(src) {
            return;
        }
        let resolved = self.env.config.resolve(src);
        let found_html = found_image_html(src, &resolved.to_string_lossy());

        match self.env.images.lookup(src, dom) {
            (ImageStatus::Found, _) => dom.set_html(found_html),
            (ImageStatus::Missing, _) => {}
            (ImageStatus::Pending, false) => {}
            (ImageStatus::Pending, true) => {
                let check = self.env.platform.paths.exists(&resolved);
                let cache = self.env.images.clone();
                let src = SmolStr::new(src);
                self.env.platform.spawner.spawn_local(Box::pin(async move {
                    let found = check.await;
                    let upgraded = cache.resolve(&src, found, &found_html);
                    tracing::trace!(target: "scrivo::widget", %src, found, upgraded, "image check finished");
                }));
            }
        }
    }

    /// Copy a code block through its header widget. On success the header
    /// shows a check icon until the feedback delay passes.
    pub fn copy_code(&self, dom_id: u64) -> bool {
        let Some(mounted) = self.mounted.iter().find(|m| m.dom.id() == dom_id) else {
            return false;
        };
        let Widget::CodeHeader { code, .. } = &mounted.widget else {
            return false;
        };
        if let Err(err) = self.env.platform.clipboard.write_text(code) {
            tracing::warn!(target: "scrivo::widget", %err, "copy to clipboard failed");
            return false;
        }

        let dom = &mounted.dom;
        dom.set_attr("data-copy-icon", "check");
        let revision = dom.bump_revision();
        let weak = dom.downgrade();
        let sleep = self.env.platform.timer.sleep(self.env.config.copy_feedback);
        self.env.platform.spawner.spawn_local(Box::pin(async move {
            sleep.await;
            // A later copy owns the icon now, or the header is gone.
            if let Some(dom) = weak.upgrade()
                && dom.is_alive()
                && dom.revision() == revision
            {
                dom.set_attr("data-copy-icon", "copy");
            }
        }));
        true
    }
}

impl Drop for WidgetManager {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl std::fmt::Debug for WidgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetManager")
            .field("mounted", &self.mounted.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn missing_image_html(src: &str) -> String {
    format!(
        "<span class=\"md-image-error\">Image not found: {}</span>",
        scrivo_renderer::escape_text(src)
    )
}

fn found_image_html(src: &str, resolved: &str) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\">",
        scrivo_renderer::escape_url(resolved),
        scrivo_renderer::escape_text(src)
    )
}
