/// Where the chat panel is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatHost {
    /// Beside the map, in the normal page layout.
    Sidebar,
    /// Floating over the fullscreen map.
    MapOverlay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    fullscreen: bool,
}

impl OverlayState {
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Flip fullscreen and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    pub fn chat_host(&self) -> ChatHost {
        if self.fullscreen {
            ChatHost::MapOverlay
        } else {
            ChatHost::Sidebar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_moves_over_map_in_fullscreen() {
        let mut o = OverlayState::default();
        assert_eq!(o.chat_host(), ChatHost::Sidebar);
        o.toggle();
        assert_eq!(o.chat_host(), ChatHost::MapOverlay);
        o.toggle();
        assert_eq!(o.chat_host(), ChatHost::Sidebar);
    }
}
