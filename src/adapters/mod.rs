//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter     | Implements                       | Connects to                 |
//! |-------------|----------------------------------|-----------------------------|
//! | `nvs`       | ConfigPort                       | NVS / in-memory store       |
//! | `serial`    | OscTransport                     | UART (SLIP framed)          |
//! | `wifi`      | OscTransport, WirelessControl    | ESP-IDF WiFi STA + UDP      |
//! | `udp`       | wifi::Datagram                   | `std::net::UdpSocket`       |
//! | `page`      | ConfigPageChannel                | HTTP server + WebSocket     |
//! | `device_id` | —                                | eFuse MAC                   |
//! | `time`      | —                                | ESP32 system timer          |

pub mod device_id;
pub mod nvs;
pub mod page;
pub mod serial;
pub mod time;
pub mod udp;
pub mod wifi;
