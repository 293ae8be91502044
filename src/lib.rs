pub mod shared {
    pub mod core {
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod event_bus;
    }
}

pub mod modules {
    pub mod groups {
        pub mod core {
            pub mod directory;
            pub mod events;
            pub mod group;
            pub mod patch;
            pub mod projection;
        }
        pub mod use_cases {
            pub mod manage_groups {
                pub mod state;
                pub mod store;
            }
            pub mod sync_changes {
                pub mod queue;
                pub mod worker;
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod gateway;
                pub mod gateway_http;
                pub mod gateway_in_memory;
                pub mod notifier;
            }
        }
        pub mod infrastructure {
            pub mod event_bus;
        }
    }
}

pub mod shell;
