//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use living_map::impl_default;
///
/// struct PanSettings {
///     enabled: bool,
///     easing_factor: f32,
/// }
///
/// impl_default!(PanSettings {
///     enabled: true,
///     easing_factor: 0.15,
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

/// 同时实现Default和new()的宏
///
/// 使用示例:
/// ```rust
/// use living_map::impl_default_and_new;
///
/// struct MaskSettings {
///     threshold: f32,
/// }
///
/// impl_default_and_new!(MaskSettings {
///     threshold: 0.5,
/// });
/// ```
#[macro_export]
macro_rules! impl_default_and_new {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }

        impl $struct_name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

#[cfg(test)]
mod tests {

    struct TestSettings {
        factor: f32,
        label: String,
    }

    impl_default_and_new!(TestSettings {
        factor: 1.0,
        label: String::new(),
    });

    #[test]
    fn test_impl_default_and_new() {
        let s1 = TestSettings::default();
        let s2 = TestSettings::new();

        assert_eq!(s1.factor, 1.0);
        assert_eq!(s1.label, "");
        assert_eq!(s2.factor, 1.0);
        assert_eq!(s2.label, "");
    }
}
