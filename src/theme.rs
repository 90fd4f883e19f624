use std::str::FromStr;

use tuirealm::ratatui::style::Color;

use crate::types::{ActivityAction, TaskStatus};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ThemePreset {
    #[default]
    Default,
    Light,
    HighContrast,
    Mono,
}

impl ThemePreset {
    pub const ALL: [Self; 4] = [Self::Default, Self::Light, Self::HighContrast, Self::Mono];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Light => "light",
            Self::HighContrast => "high-contrast",
            Self::Mono => "mono",
        }
    }
}

impl FromStr for ThemePreset {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "light" | "day" => Ok(Self::Light),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::HighContrast),
            "mono" | "monochrome" => Ok(Self::Mono),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: BasePalette,
    pub interactive: InteractivePalette,
    pub column: ColumnPalette,
    pub activity: ActivityPalette,
}

#[derive(Debug, Clone, Copy)]
pub struct BasePalette {
    pub canvas: Color,
    pub surface: Color,
    pub text: Color,
    pub text_muted: Color,
    pub header: Color,
    pub accent: Color,
    pub success: Color,
    pub danger: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct InteractivePalette {
    pub focus: Color,
    pub selected_bg: Color,
    pub selected_border: Color,
    pub border: Color,
    pub drop_target: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnPalette {
    pub todo: Color,
    pub in_progress: Color,
    pub done: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct ActivityPalette {
    pub created: Color,
    pub updated: Color,
    pub moved: Color,
    pub deleted: Color,
    pub comment: Color,
    pub other: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct TileStateColors {
    pub background: Color,
    pub border: Color,
}

impl Theme {
    pub fn from_preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Default => Self {
                base: BasePalette {
                    canvas: Color::Rgb(36, 40, 56),
                    surface: Color::Rgb(44, 48, 66),
                    text: Color::White,
                    text_muted: Color::DarkGray,
                    header: Color::Cyan,
                    accent: Color::Magenta,
                    success: Color::LightGreen,
                    danger: Color::Red,
                },
                interactive: InteractivePalette {
                    focus: Color::Cyan,
                    selected_bg: Color::Rgb(54, 48, 72),
                    selected_border: Color::Rgb(255, 187, 120),
                    border: Color::DarkGray,
                    drop_target: Color::LightCyan,
                },
                column: ColumnPalette {
                    todo: Color::Gray,
                    in_progress: Color::LightBlue,
                    done: Color::LightGreen,
                },
                activity: ActivityPalette {
                    created: Color::Green,
                    updated: Color::Blue,
                    moved: Color::Yellow,
                    deleted: Color::Red,
                    comment: Color::Magenta,
                    other: Color::Gray,
                },
            },
            ThemePreset::Light => Self {
                base: BasePalette {
                    canvas: Color::Rgb(246, 248, 252),
                    surface: Color::Rgb(255, 255, 255),
                    text: Color::Rgb(32, 38, 51),
                    text_muted: Color::Rgb(95, 105, 122),
                    header: Color::Rgb(37, 99, 235),
                    accent: Color::Rgb(2, 132, 199),
                    success: Color::Rgb(22, 163, 74),
                    danger: Color::Rgb(185, 28, 28),
                },
                interactive: InteractivePalette {
                    focus: Color::Rgb(37, 99, 235),
                    selected_bg: Color::Rgb(227, 237, 255),
                    selected_border: Color::Rgb(59, 130, 246),
                    border: Color::Rgb(196, 208, 224),
                    drop_target: Color::Rgb(2, 132, 199),
                },
                column: ColumnPalette {
                    todo: Color::Rgb(71, 85, 105),
                    in_progress: Color::Rgb(37, 99, 235),
                    done: Color::Rgb(22, 163, 74),
                },
                activity: ActivityPalette {
                    created: Color::Rgb(22, 163, 74),
                    updated: Color::Rgb(37, 99, 235),
                    moved: Color::Rgb(202, 138, 4),
                    deleted: Color::Rgb(185, 28, 28),
                    comment: Color::Rgb(124, 58, 237),
                    other: Color::Rgb(95, 105, 122),
                },
            },
            ThemePreset::HighContrast => Self {
                base: BasePalette {
                    canvas: Color::Rgb(20, 20, 20),
                    surface: Color::Rgb(20, 20, 20),
                    text: Color::White,
                    text_muted: Color::Gray,
                    header: Color::LightCyan,
                    accent: Color::LightBlue,
                    success: Color::LightGreen,
                    danger: Color::LightRed,
                },
                interactive: InteractivePalette {
                    focus: Color::LightCyan,
                    selected_bg: Color::Rgb(36, 36, 36),
                    selected_border: Color::LightYellow,
                    border: Color::Gray,
                    drop_target: Color::LightYellow,
                },
                column: ColumnPalette {
                    todo: Color::White,
                    in_progress: Color::LightCyan,
                    done: Color::LightGreen,
                },
                activity: ActivityPalette {
                    created: Color::LightGreen,
                    updated: Color::LightBlue,
                    moved: Color::LightYellow,
                    deleted: Color::LightRed,
                    comment: Color::LightMagenta,
                    other: Color::White,
                },
            },
            ThemePreset::Mono => Self {
                base: BasePalette {
                    canvas: Color::Rgb(26, 26, 26),
                    surface: Color::Rgb(26, 26, 26),
                    text: Color::White,
                    text_muted: Color::Gray,
                    header: Color::White,
                    accent: Color::Gray,
                    success: Color::White,
                    danger: Color::White,
                },
                interactive: InteractivePalette {
                    focus: Color::White,
                    selected_bg: Color::Rgb(35, 35, 35),
                    selected_border: Color::White,
                    border: Color::Gray,
                    drop_target: Color::White,
                },
                column: ColumnPalette {
                    todo: Color::Gray,
                    in_progress: Color::White,
                    done: Color::Gray,
                },
                activity: ActivityPalette {
                    created: Color::White,
                    updated: Color::White,
                    moved: Color::White,
                    deleted: Color::White,
                    comment: Color::White,
                    other: Color::Gray,
                },
            },
        }
    }

    pub fn column_accent(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Todo => self.column.todo,
            TaskStatus::InProgress => self.column.in_progress,
            TaskStatus::Done => self.column.done,
        }
    }

    pub fn activity_color(&self, action: ActivityAction) -> Color {
        match action {
            ActivityAction::TaskCreated | ActivityAction::ProjectCreated => self.activity.created,
            ActivityAction::TaskUpdated => self.activity.updated,
            ActivityAction::TaskMoved => self.activity.moved,
            ActivityAction::TaskDeleted => self.activity.deleted,
            ActivityAction::CommentAdded => self.activity.comment,
            ActivityAction::Other => self.activity.other,
        }
    }

    pub fn tile_colors(&self, selected: bool) -> TileStateColors {
        if selected {
            TileStateColors {
                background: self.interactive.selected_bg,
                border: self.interactive.selected_border,
            }
        } else {
            TileStateColors {
                background: Color::Reset,
                border: self.interactive.border,
            }
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_preset(ThemePreset::Default)
    }
}
