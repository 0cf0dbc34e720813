// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod axe_engine;
pub mod lighthouse_engine;
pub mod runner_client;
pub mod sitemap;
pub mod traits;
