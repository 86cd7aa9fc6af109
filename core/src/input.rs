//! Input types independent of any windowing or browser library.
//!
//! Hosts convert their native mouse, touch, pointer and keyboard events into
//! these types before handing them to [`crate::HomeComponent3D::dispatch_input`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Element state (pressed or released)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementState {
    Pressed,
    Released,
}

/// Mouse button identifier
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Kind of device behind a pointer event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

/// One finger on a touch surface, in client coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TouchPoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    pub fn distance_to(&self, other: &TouchPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Keyboard logical key (with consideration for layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named key
    Named(NamedKey),
    /// A character key, compared case-insensitively
    Character(char),
    /// An unidentified key
    Unidentified,
}

impl Key {
    /// Uppercases character keys so `w` and `W` map to the same stroke.
    pub fn normalized(self) -> Self {
        match self {
            Key::Character(c) => Key::Character(c.to_ascii_uppercase()),
            other => other,
        }
    }
}

/// Named keyboard keys
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Control,
    Alt,
    Shift,
    Meta,
}

/// Keyboard modifiers state
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    /// Shift alone, the plain "shift down" test used for presses.
    pub fn is_shift_only(&self) -> bool {
        self.shift && !self.alt && !self.control && !self.meta
    }
}

bitflags! {
    /// Set of modifiers qualifying a [`KeyStroke`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierSet: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl From<Modifiers> for ModifierSet {
    fn from(modifiers: Modifiers) -> Self {
        let mut set = ModifierSet::empty();
        set.set(ModifierSet::SHIFT, modifiers.shift);
        set.set(ModifierSet::CONTROL, modifiers.control);
        set.set(ModifierSet::ALT, modifiers.alt);
        set.set(ModifierSet::META, modifiers.meta);
        set
    }
}

/// Keyboard event
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub state: ElementState,
    /// Modifiers held once the key event happened: pressing alt reports alt,
    /// releasing it does not.
    pub modifiers: Modifiers,
    pub repeat: bool,
}

/// A key press or release qualified by the modifiers held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub modifiers: ModifierSet,
    pub key: Key,
    pub pressed: bool,
}

impl KeyStroke {
    pub fn pressed(modifiers: ModifierSet, key: Key) -> Self {
        Self {
            modifiers,
            key: key.normalized(),
            pressed: true,
        }
    }

    pub fn released(modifiers: ModifierSet, key: Key) -> Self {
        Self {
            modifiers,
            key: key.normalized(),
            pressed: false,
        }
    }

    pub fn for_event(event: &KeyEvent) -> Self {
        let modifiers = ModifierSet::from(event.modifiers);
        match event.state {
            ElementState::Pressed => Self::pressed(modifiers, event.key),
            ElementState::Released => Self::released(modifiers, event.key),
        }
    }
}

/// Operating system family, which decides the modifier keys bound to
/// alignment, duplication and magnetism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformFamily {
    Windows,
    MacOs,
    /// Linux and other Unix desktops.
    #[default]
    Other,
}

impl PlatformFamily {
    /// Family of the platform the crate was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformFamily::Windows
        } else if cfg!(target_os = "macos") {
            PlatformFamily::MacOs
        } else {
            PlatformFamily::Other
        }
    }

    pub fn is_alignment_activated(self, modifiers: &Modifiers) -> bool {
        match self {
            PlatformFamily::Windows | PlatformFamily::MacOs => modifiers.shift,
            PlatformFamily::Other => modifiers.shift && !modifiers.alt,
        }
    }

    pub fn is_duplication_activated(self, modifiers: &Modifiers) -> bool {
        match self {
            PlatformFamily::MacOs => modifiers.alt,
            PlatformFamily::Windows | PlatformFamily::Other => modifiers.control,
        }
    }

    pub fn is_magnetism_toggled(self, modifiers: &Modifiers) -> bool {
        match self {
            PlatformFamily::Windows => modifiers.alt,
            PlatformFamily::MacOs => modifiers.meta,
            PlatformFamily::Other => modifiers.shift && modifiers.alt,
        }
    }
}

/// Modifier-derived flags passed with a press.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PressFlags {
    pub shift_down: bool,
    pub alignment_activated: bool,
    pub duplication_activated: bool,
    pub magnetism_toggled: bool,
}

impl PressFlags {
    pub fn from_modifiers(platform: PlatformFamily, modifiers: &Modifiers) -> Self {
        Self {
            shift_down: modifiers.is_shift_only(),
            alignment_activated: platform.is_alignment_activated(modifiers),
            duplication_activated: platform.is_duplication_activated(modifiers),
            magnetism_toggled: platform.is_magnetism_toggled(modifiers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_modifier_table() {
        let alt = Modifiers { alt: true, ..Modifiers::NONE };
        let shift_alt = Modifiers { shift: true, alt: true, ..Modifiers::NONE };
        let meta = Modifiers { meta: true, ..Modifiers::NONE };

        assert!(PlatformFamily::Windows.is_magnetism_toggled(&alt));
        assert!(!PlatformFamily::MacOs.is_magnetism_toggled(&alt));
        assert!(PlatformFamily::MacOs.is_magnetism_toggled(&meta));
        assert!(PlatformFamily::MacOs.is_duplication_activated(&alt));
        assert!(!PlatformFamily::Other.is_magnetism_toggled(&alt));
        assert!(PlatformFamily::Other.is_magnetism_toggled(&shift_alt));
        assert!(!PlatformFamily::Other.is_alignment_activated(&shift_alt));
        assert!(PlatformFamily::Windows.is_alignment_activated(&shift_alt));
    }

    #[test]
    fn test_press_flags_shift_down_needs_shift_alone() {
        let flags = PressFlags::from_modifiers(PlatformFamily::Other, &Modifiers::shift());
        assert!(flags.shift_down);
        assert!(flags.alignment_activated);

        let shift_control = Modifiers { shift: true, control: true, ..Modifiers::NONE };
        let flags = PressFlags::from_modifiers(PlatformFamily::Other, &shift_control);
        assert!(!flags.shift_down);
        assert!(flags.duplication_activated);
    }

    #[test]
    fn test_key_stroke_ignores_character_case() {
        let lower = KeyStroke::pressed(ModifierSet::empty(), Key::Character('w'));
        let upper = KeyStroke::pressed(ModifierSet::empty(), Key::Character('W'));
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_key_stroke_for_event() {
        let event = KeyEvent {
            key: Key::Named(NamedKey::Alt),
            state: ElementState::Pressed,
            modifiers: Modifiers { alt: true, ..Modifiers::NONE },
            repeat: false,
        };
        let stroke = KeyStroke::for_event(&event);
        assert!(stroke.pressed);
        assert_eq!(stroke.modifiers, ModifierSet::ALT);
    }
}
