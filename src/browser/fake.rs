//! Scripted in-memory page for unit tests
//!
//! Elements carry an optional screen number; only elements of the current screen are
//! visible, and clicking an `advances()` button moves to the next screen. The results
//! grid is produced by a closure over the current element values so slider changes
//! show up in the panel.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{GridLayout, GridRow, Locator, Page};
use crate::error::{Result, SweepError};

#[derive(Debug, Clone, PartialEq)]
pub enum FakeKind {
    Input,
    Slider,
    /// Native select or radio group: `(value, label)` options
    Choice(Vec<(String, String)>),
    Button,
    Text,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub id: Option<String>,
    pub label: Option<String>,
    pub text: Option<String>,
    pub kind: FakeKind,
    pub value: String,
    pub screen: Option<u8>,
    pub visible: bool,
    /// Accepts writes but keeps its old value
    pub sticky: bool,
    pub advances: bool,
}

impl FakeElement {
    fn new(kind: FakeKind) -> Self {
        Self {
            id: None,
            label: None,
            text: None,
            kind,
            value: String::new(),
            screen: None,
            visible: true,
            sticky: false,
            advances: false,
        }
    }

    pub fn input(id: &str) -> Self {
        Self::new(FakeKind::Input).with_id(id)
    }

    pub fn slider(id: &str, value: u32) -> Self {
        let mut el = Self::new(FakeKind::Slider).with_id(id);
        el.value = value.to_string();
        el
    }

    pub fn choice(id: &str, options: &[(&str, &str)]) -> Self {
        let options = options
            .iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect();
        Self::new(FakeKind::Choice(options)).with_id(id)
    }

    pub fn button(text: &str) -> Self {
        let mut el = Self::new(FakeKind::Button);
        el.text = Some(text.to_string());
        el
    }

    pub fn text(text: &str) -> Self {
        let mut el = Self::new(FakeKind::Text);
        el.text = Some(text.to_string());
        el
    }

    pub fn unlabeled_input() -> Self {
        Self::new(FakeKind::Input)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn on_screen(mut self, screen: u8) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    pub fn advances(mut self) -> Self {
        self.advances = true;
        self
    }
}

/// Element values and the current screen, visible to the grid closure
#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub elements: Vec<FakeElement>,
    pub screen: u8,
}

impl FakeState {
    pub fn value(&self, id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|el| el.id.as_deref() == Some(id))
            .map(|el| el.value.as_str())
    }

    fn is_shown(&self, el: &FakeElement) -> bool {
        el.visible && el.screen.map_or(true, |s| s == self.screen)
    }

    fn resolve(&self, locator: &Locator) -> Option<usize> {
        let contains = |haystack: &Option<String>, needle: &str| {
            haystack
                .as_deref()
                .map_or(false, |h| h.to_lowercase().contains(&needle.to_lowercase()))
        };

        self.elements.iter().position(|el| match locator {
            Locator::Id(id) => el.id.as_deref() == Some(id.as_str()),
            Locator::Css(css) => css
                .strip_prefix('#')
                .map_or(false, |id| el.id.as_deref() == Some(id)),
            Locator::Label(label) => self.is_shown(el) && contains(&el.label, label),
            Locator::Text(text) => self.is_shown(el) && contains(&el.text, text),
            Locator::Button(text) => {
                self.is_shown(el) && el.kind == FakeKind::Button && contains(&el.text, text)
            }
        })
    }
}

pub type GridFn = Arc<dyn Fn(&FakeState) -> Option<Vec<GridRow>> + Send + Sync>;

pub struct FakePage {
    pub state: FakeState,
    grid_fn: Option<GridFn>,
    pub texts: HashMap<String, Vec<String>>,
    pub visited: Vec<String>,
    pub clicks: Vec<String>,
    pub slider_log: Vec<(String, u32)>,
    pub fail_goto: bool,
    pub fail_screenshots: bool,
    /// read_grid returns a lost-session error once this many reads have happened
    pub lose_session_after_reads: Option<usize>,
    pub grid_reads: usize,
    pub close_calls: usize,
    screenshots: usize,
}

impl FakePage {
    pub const SCREENSHOT_BYTES: &'static [u8] = b"\x89PNG fake";

    pub fn new() -> Self {
        Self {
            state: FakeState::default(),
            grid_fn: None,
            texts: HashMap::new(),
            visited: Vec::new(),
            clicks: Vec::new(),
            slider_log: Vec::new(),
            fail_goto: false,
            fail_screenshots: false,
            lose_session_after_reads: None,
            grid_reads: 0,
            close_calls: 0,
            screenshots: 0,
        }
    }

    pub fn with(mut self, element: FakeElement) -> Self {
        self.state.elements.push(element);
        self
    }

    pub fn with_grid(mut self, grid: impl Fn(&FakeState) -> Option<Vec<GridRow>> + Send + Sync + 'static) -> Self {
        self.grid_fn = Some(Arc::new(grid));
        self
    }

    pub fn with_texts(mut self, css: &str, texts: &[&str]) -> Self {
        self.texts
            .insert(css.to_string(), texts.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn on_screen(mut self, screen: u8) -> Self {
        self.state.screen = screen;
        self
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.state.value(id)
    }

    pub fn screenshots_taken(&self) -> usize {
        self.screenshots
    }

    fn element_mut(&mut self, locator: &Locator) -> Option<&mut FakeElement> {
        let index = self.state.resolve(locator)?;
        self.state.elements.get_mut(index)
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        if self.fail_goto {
            return Err(SweepError::WebDriver(format!("cannot reach {}", url)));
        }
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<bool> {
        match self.element_mut(locator) {
            Some(el) if matches!(el.kind, FakeKind::Input | FakeKind::Slider) => {
                if !el.sticky {
                    el.value = value.to_string();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn read_value(&mut self, locator: &Locator) -> Result<Option<String>> {
        Ok(self
            .element_mut(locator)
            .filter(|el| matches!(el.kind, FakeKind::Input | FakeKind::Slider))
            .map(|el| el.value.clone()))
    }

    async fn select(&mut self, locator: &Locator, value: &str, label: &str) -> Result<bool> {
        let el = match self.element_mut(locator) {
            Some(el) => el,
            None => return Ok(false),
        };
        let options = match &el.kind {
            FakeKind::Choice(options) => options.clone(),
            _ => return Ok(false),
        };
        let wanted = label.to_lowercase();
        let option = options
            .iter()
            .find(|(v, l)| v == value || l.to_lowercase() == wanted);
        match option {
            Some((v, _)) => {
                if !el.sticky {
                    el.value = v.clone();
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_selection(&mut self, locator: &Locator) -> Result<Option<String>> {
        let el = match self.element_mut(locator) {
            Some(el) => el,
            None => return Ok(None),
        };
        match &el.kind {
            FakeKind::Choice(options) => Ok(Some(
                options
                    .iter()
                    .find(|(v, _)| *v == el.value)
                    .map(|(v, l)| format!("{} {}", v, l))
                    .unwrap_or_default(),
            )),
            _ => Ok(None),
        }
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool> {
        let index = match self.state.resolve(locator) {
            Some(index) => index,
            None => return Ok(false),
        };
        let el = &self.state.elements[index];
        let name = el.id.clone().or_else(|| el.text.clone()).unwrap_or_default();
        let advances = el.advances;
        self.clicks.push(name);
        if advances {
            self.state.screen += 1;
        }
        Ok(true)
    }

    async fn set_slider(&mut self, locator: &Locator, value: u32) -> Result<bool> {
        let name = locator.to_string();
        match self.element_mut(locator) {
            Some(el) if el.kind == FakeKind::Slider => {
                el.value = value.to_string();
                self.slider_log.push((name, value));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        Ok(self
            .state
            .resolve(locator)
            .map_or(false, |i| self.state.is_shown(&self.state.elements[i])))
    }

    async fn read_texts(&mut self, css: &str) -> Result<Vec<String>> {
        Ok(self.texts.get(css).cloned().unwrap_or_default())
    }

    async fn read_grid(&mut self, _layout: &GridLayout) -> Result<Option<Vec<GridRow>>> {
        if let Some(limit) = self.lose_session_after_reads {
            if self.grid_reads >= limit {
                return Err(SweepError::SessionLost("browser crashed".to_string()));
            }
        }
        self.grid_reads += 1;
        Ok(self.grid_fn.as_ref().and_then(|f| f(&self.state)))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        if self.fail_screenshots {
            return Err(SweepError::Script("screenshot unavailable".to_string()));
        }
        self.screenshots += 1;
        Ok(Self::SCREENSHOT_BYTES.to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        Ok(())
    }
}
