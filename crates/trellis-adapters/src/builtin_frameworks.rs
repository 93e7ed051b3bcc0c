//! Framework discovery and the framework that ships in the binary.
//!
//! [`load_registry`] is the single entry-point for building the framework
//! registry of one run. It abstracts over where frameworks live so callers
//! do not need to know the discovery strategy.
//!
//! # Resolution order
//!
//! The built-in React framework is registered first. Framework directories
//! found in the following places are registered on top, a later framework
//! replacing an earlier one with the same id:
//!
//! 1. **`$TRELLIS_FRAMEWORKS_DIR`** - environment variable override.
//! 2. **Configured paths** - `frameworks.paths` from the CLI config.
//! 3. **`./frameworks`** - relative to the current working directory.
//! 4. **`<executable-dir>/frameworks`** - sibling to the `trellis` binary.
//!
//! Invalid framework directories are skipped with a `WARN` log.
//!
//! ```env
//! TRELLIS_FRAMEWORKS_DIR=./frameworks
//! ```

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use trellis_core::domain::{
    AddOn, AddOnType, DomainError, Framework, FrameworkRegistry, Integration,
    IntegrationKind, Mode, ModeInfo, PackageAdditions, Phase, Route,
};

use crate::framework_loader::FilesystemFrameworkLoader;

/// Environment variable pointing at an extra frameworks directory.
pub const FRAMEWORKS_DIR_VAR: &str = "TRELLIS_FRAMEWORKS_DIR";

// ── Public API ────────────────────────────────────────────────────────────────

/// Build the framework registry for one run.
///
/// # Errors
///
/// Only the built-in framework failing validation is an error; that would be
/// a bug in this crate.
#[instrument(skip_all, fields(extra = extra_paths.len()))]
pub fn load_registry(extra_paths: &[PathBuf]) -> Result<FrameworkRegistry, DomainError> {
    let mut registry = FrameworkRegistry::new();
    registry.register(builtin::react())?;

    let env_dir = std::env::var_os(FRAMEWORKS_DIR_VAR).map(PathBuf::from);
    let roots = candidate_paths(env_dir, extra_paths);
    let discovered = FilesystemFrameworkLoader::discover(&roots);

    for framework in discovered {
        let id = framework.id.clone();
        match registry.register(framework) {
            Ok(_) => debug!(id = %id, "registered framework from disk"),
            Err(e) => warn!(id = %id, error = %e, "skipping invalid framework"),
        }
    }

    info!(count = registry.list().len(), "framework registry ready");
    Ok(registry)
}

// ── Resolution helpers ────────────────────────────────────────────────────────

/// Ordered list of roots to search. Missing roots are filtered later.
fn candidate_paths(env_dir: Option<PathBuf>, extra_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(extra_paths.len() + 3);

    if let Some(dir) = env_dir {
        debug!(path = %dir.display(), "candidate from ${FRAMEWORKS_DIR_VAR}");
        paths.push(dir);
    }
    paths.extend(extra_paths.iter().cloned());
    paths.push(PathBuf::from("frameworks"));
    if let Some(sibling) = exe_sibling_frameworks() {
        paths.push(sibling);
    }

    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}

/// `<directory of current executable>/frameworks`, when it can be determined.
fn exe_sibling_frameworks() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("frameworks")))
}

// ── Built-in framework ────────────────────────────────────────────────────────

/// The framework compiled into the binary.
pub mod builtin {
    use super::*;

    pub const REACT: &str = "react";

    /// React with TanStack Router, in file-router and code-router modes.
    pub fn react() -> Framework {
        let mut fw = Framework::new(REACT, "React");
        fw.description = "React with TanStack Router and Vite".into();
        fw.supported_modes = BTreeMap::from([
            (
                Mode::FILE_ROUTER.to_string(),
                ModeInfo {
                    display_name: "File Router".into(),
                    description: "Routes generated from src/routes".into(),
                    force_typescript: true,
                },
            ),
            (
                Mode::CODE_ROUTER.to_string(),
                ModeInfo {
                    display_name: "Code Router".into(),
                    description: "Routes declared in code".into(),
                    force_typescript: false,
                },
            ),
        ]);
        fw.default_mode = Some(Mode::file_router());
        fw.base_files = files(&[
            ("./_dot_gitignore", GITIGNORE),
            ("./index.html.ejs", INDEX_HTML),
            ("./vite.config.ts.ejs", VITE_CONFIG),
            ("./tsconfig.json.ejs", TSCONFIG),
            ("./README.md.ejs", README),
            ("./src/main.tsx.ejs", MAIN),
            ("./src/App.tsx.ejs", APP),
            ("./src/routes/__root.tsx.ejs", ROOT_ROUTE),
            ("./src/routes/index.tsx.ejs", INDEX_ROUTE),
            ("./src/styles.css.ejs", STYLES),
        ]);
        fw.base_package_json = json!({
            "name": "",
            "private": true,
            "type": "module",
            "scripts": {
                "dev": "vite --port 3000",
                "build": "vite build",
                "serve": "vite preview"
            },
            "dependencies": {
                "@tanstack/react-router": "^1.130.0",
                "react": "^19.0.0",
                "react-dom": "^19.0.0"
            },
            "devDependencies": {
                "@vitejs/plugin-react": "^4.3.4",
                "vite": "^6.3.5"
            }
        });
        fw.optional_packages = BTreeMap::from([
            (
                "typescript".to_string(),
                json!({ "devDependencies": {
                    "@types/react": "^19.0.8",
                    "@types/react-dom": "^19.0.3",
                    "typescript": "^5.7.2"
                }}),
            ),
            (
                "tailwindcss".to_string(),
                json!({ "dependencies": {
                    "@tailwindcss/vite": "^4.0.6",
                    "tailwindcss": "^4.0.6"
                }}),
            ),
            (
                Mode::FILE_ROUTER.to_string(),
                json!({ "devDependencies": { "@tanstack/router-plugin": "^1.130.0" } }),
            ),
        ]);
        fw.add_ons = add_ons().into_iter().map(Arc::new).collect();
        fw
    }

    fn add_ons() -> Vec<AddOn> {
        let both = vec![Mode::file_router(), Mode::code_router()];

        vec![
            AddOn {
                description: "Data fetching and caching".into(),
                modes: both.clone(),
                priority: 20,
                files: files(&[(
                    "./src/integrations/tanstack-query/root-provider.tsx",
                    QUERY_PROVIDER,
                )]),
                package_additions: deps(&[("@tanstack/react-query", "^5.66.5")], &[]),
                integrations: vec![Integration {
                    kind: IntegrationKind::RootProvider,
                    path: Some("src/integrations/tanstack-query/root-provider.tsx".into()),
                    js_name: Some("TanStackQueryProvider".into()),
                    import: Some(
                        "import TanStackQueryProvider from '../integrations/tanstack-query/root-provider'"
                            .into(),
                    ),
                    code: None,
                }],
                ..AddOn::new("tanstack-query", "TanStack Query")
            },
            AddOn {
                description: "Framework-agnostic reactive store".into(),
                modes: both.clone(),
                priority: 10,
                files: files(&[("./src/lib/demo-store.ts", DEMO_STORE)]),
                package_additions: deps(
                    &[("@tanstack/react-store", "^0.7.0"), ("@tanstack/store", "^0.7.0")],
                    &[],
                ),
                ..AddOn::new("tanstack-store", "TanStack Store")
            },
            AddOn {
                description: "Accessible components built on Tailwind".into(),
                phase: Phase::Setup,
                modes: both.clone(),
                priority: 15,
                tailwind: Some(true),
                shadcn_components: vec!["button".into()],
                files: files(&[("./components.json.ejs", SHADCN_CONFIG), ("./src/lib/utils.ts", UTILS)]),
                package_additions: deps(
                    &[("clsx", "^2.1.1"), ("tailwind-merge", "^3.0.2")],
                    &[],
                ),
                ..AddOn::new("shadcn", "Shadcn")
            },
            AddOn {
                kind: AddOnType::Example,
                phase: Phase::Example,
                description: "A route fetching data with TanStack Query".into(),
                modes: vec![Mode::file_router()],
                depends_on: vec!["tanstack-query".into()],
                files: files(&[("./src/routes/demo.tanstack-query.tsx", QUERY_DEMO)]),
                routes: vec![Route {
                    url: Some("/demo/tanstack-query".into()),
                    name: "TanStack Query".into(),
                    path: "src/routes/demo.tanstack-query.tsx".into(),
                    js_name: Some("TanStackQueryDemo".into()),
                }],
                ..AddOn::new("query-demo", "Query Demo")
            },
            AddOn {
                kind: AddOnType::Toolchain,
                description: "Fast formatter and linter".into(),
                modes: both.clone(),
                files: files(&[("./biome.json", BIOME)]),
                package_additions: PackageAdditions {
                    dev_dependencies: pairs(&[("@biomejs/biome", "2.2.4")]),
                    scripts: pairs(&[
                        ("format", "biome format"),
                        ("lint", "biome lint"),
                        ("check", "biome check"),
                    ]),
                    ..PackageAdditions::default()
                },
                ..AddOn::new("biome", "Biome")
            },
            AddOn {
                kind: AddOnType::Toolchain,
                description: "ESLint and Prettier".into(),
                modes: both.clone(),
                files: files(&[("./eslint.config.js", ESLINT), ("./prettier.config.js", PRETTIER)]),
                package_additions: PackageAdditions {
                    dev_dependencies: pairs(&[
                        ("@tanstack/eslint-config", "^0.3.0"),
                        ("prettier", "^3.5.3"),
                    ]),
                    scripts: pairs(&[
                        ("lint", "eslint"),
                        ("format", "prettier"),
                        ("check", "prettier --write . && eslint --fix"),
                    ]),
                    ..PackageAdditions::default()
                },
                ..AddOn::new("eslint", "ESLint")
            },
            AddOn {
                kind: AddOnType::Deployment,
                description: "Deploy to Netlify".into(),
                modes: both.clone(),
                files: files(&[("./netlify.toml", NETLIFY)]),
                ..AddOn::new("netlify", "Netlify")
            },
            AddOn {
                kind: AddOnType::Deployment,
                description: "Deploy to Vercel".into(),
                modes: both,
                files: files(&[("./vercel.json", VERCEL)]),
                warning: Some("Run `vercel login` before deploying".into()),
                ..AddOn::new("vercel", "Vercel")
            },
        ]
    }

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs(entries)
    }

    fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn deps(dependencies: &[(&str, &str)], dev: &[(&str, &str)]) -> PackageAdditions {
        PackageAdditions {
            dependencies: pairs(dependencies),
            dev_dependencies: pairs(dev),
            scripts: BTreeMap::new(),
        }
    }

    // ── File contents ─────────────────────────────────────────────────────

    const GITIGNORE: &str = "node_modules\n.DS_Store\ndist\ndist-ssr\n*.local\n.env\n";

    const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{{ project_name }}</title>
  </head>
  <body>
    <div id="app"></div>
    <script type="module" src="/src/main.{{ jsx }}"></script>
  </body>
</html>
"#;

    const VITE_CONFIG: &str = r#"import { defineConfig } from 'vite'
import viteReact from '@vitejs/plugin-react'
{% if tailwind %}import tailwindcss from '@tailwindcss/vite'
{% endif %}{% if file_router %}import { tanstackRouter } from '@tanstack/router-plugin/vite'
{% endif %}{% for integration in integrations %}{% if integration.type == "vite-plugin" %}{{ integration.import }}
{% endif %}{% endfor %}
export default defineConfig({
  plugins: [
    {% if file_router %}tanstackRouter({ autoCodeSplitting: true }),
    {% endif %}viteReact(),
    {% if tailwind %}tailwindcss(),
    {% endif %}{% for integration in integrations %}{% if integration.type == "vite-plugin" %}{{ integration.code }},
    {% endif %}{% endfor %}
  ],
})
"#;

    const TSCONFIG: &str = r#"{% if not typescript %}{{ ignore_file() }}{% endif %}{
  "include": ["**/*.ts", "**/*.tsx"],
  "compilerOptions": {
    "target": "ES2022",
    "jsx": "react-jsx",
    "module": "ESNext",
    "lib": ["ES2022", "DOM", "DOM.Iterable"],
    "types": ["vite/client"],
    "moduleResolution": "bundler",
    "noEmit": true,
    "strict": true,
    "skipLibCheck": true
  }
}
"#;

    const README: &str = r#"# {{ project_name }}

## Getting started

```bash
{{ get_package_manager_run_script(script="dev") }}
```
{% for add_on in add_ons %}{% if add_on.readme %}
{{ add_on.readme }}
{% endif %}{% endfor %}"#;

    const MAIN: &str = r#"import { StrictMode } from 'react'
import ReactDOM from 'react-dom/client'
import { RouterProvider, createRouter } from '@tanstack/react-router'
{% if file_router %}import { routeTree } from './routeTree.gen'
{% else %}import App from './App'
{% endif %}
import './styles.css'

{% if file_router %}const router = createRouter({ routeTree, defaultPreload: 'intent' })
{% else %}const router = App()
{% endif %}{% if typescript %}
declare module '@tanstack/react-router' {
  interface Register {
    router: typeof router
  }
}
{% endif %}
const rootElement = document.getElementById('app')
if (rootElement && !rootElement.innerHTML) {
  ReactDOM.createRoot(rootElement).render(
    <StrictMode>
      <RouterProvider router={router} />
    </StrictMode>,
  )
}
"#;

    const APP: &str = r#"{% if file_router %}{{ ignore_file() }}{% endif %}import {
  Outlet,
  createRootRoute,
  createRoute,
  createRouter,
} from '@tanstack/react-router'
{% for integration in integrations %}{% if integration.type == "root-provider" %}import {{ integration.jsName }} from '{{ relative_path(path=integration.path, strip_extension=true) }}'
{% endif %}{% endfor %}
const rootRoute = createRootRoute({
  component: () => (
    <>
      {% for integration in integrations %}{% if integration.type == "root-provider" %}<{{ integration.jsName }}>
      {% endif %}{% endfor %}<Outlet />
      {% for integration in integrations | reverse %}{% if integration.type == "root-provider" %}</{{ integration.jsName }}>
      {% endif %}{% endfor %}
    </>
  ),
})

const indexRoute = createRoute({
  getParentRoute: () => rootRoute,
  path: '/',
  component: () => <h1>{{ project_name }}</h1>,
})

export default function App() {
  return createRouter({ routeTree: rootRoute.addChildren([indexRoute]) })
}
"#;

    const ROOT_ROUTE: &str = r#"{% if not file_router %}{{ ignore_file() }}{% endif %}import { Outlet, createRootRoute } from '@tanstack/react-router'
{% for integration in integrations %}{% if integration.type == "root-provider" %}{{ integration.import }}
{% endif %}{% endfor %}
export const Route = createRootRoute({
  component: () => (
    {% for integration in integrations %}{% if integration.type == "root-provider" %}<{{ integration.jsName }}>
    {% endif %}{% endfor %}<Outlet />
    {% for integration in integrations | reverse %}{% if integration.type == "root-provider" %}</{{ integration.jsName }}>
    {% endif %}{% endfor %}
  ),
})
"#;

    const INDEX_ROUTE: &str = r#"{% if not file_router %}{{ ignore_file() }}{% endif %}import { createFileRoute } from '@tanstack/react-router'

export const Route = createFileRoute('/')({
  component: App,
})

function App() {
  return (
    <main{% if tailwind %} className="p-8"{% endif %}>
      <h1>{{ project_name }}</h1>
      <ul>
        {% for route in routes %}<li><a href="{{ route.url }}">{{ route.name }}</a></li>
        {% endfor %}
      </ul>
    </main>
  )
}
"#;

    const STYLES: &str = r#"{% if tailwind %}@import "tailwindcss";
{% endif %}
body {
  margin: 0;
  font-family: system-ui, sans-serif;
}
"#;

    const QUERY_PROVIDER: &str = r#"import { QueryClient, QueryClientProvider } from '@tanstack/react-query'

const queryClient = new QueryClient()

export default function TanStackQueryProvider({ children }: { children: React.ReactNode }) {
  return <QueryClientProvider client={queryClient}>{children}</QueryClientProvider>
}
"#;

    const QUERY_DEMO: &str = r#"import { useQuery } from '@tanstack/react-query'
import { createFileRoute } from '@tanstack/react-router'

export const Route = createFileRoute('/demo/tanstack-query')({
  component: TanStackQueryDemo,
})

function TanStackQueryDemo() {
  const { data } = useQuery({
    queryKey: ['people'],
    queryFn: () => Promise.resolve([{ name: 'John Doe' }, { name: 'Jane Doe' }]),
    initialData: [],
  })

  return (
    <ul>
      {data.map((person) => (
        <li key={person.name}>{person.name}</li>
      ))}
    </ul>
  )
}
"#;

    const DEMO_STORE: &str = r#"import { Derived, Store } from '@tanstack/store'

export const store = new Store({ firstName: 'Jane', lastName: 'Smith' })

export const fullName = new Derived({
  fn: () => `${store.state.firstName} ${store.state.lastName}`,
  deps: [store],
})

fullName.mount()
"#;

    const SHADCN_CONFIG: &str = r#"{
  "$schema": "https://ui.shadcn.com/schema.json",
  "style": "new-york",
  "rsc": false,
  "tsx": {{ typescript }},
  "tailwind": {
    "config": "",
    "css": "src/styles.css",
    "baseColor": "zinc",
    "cssVariables": true
  },
  "aliases": {
    "components": "@/components",
    "utils": "@/lib/utils"
  }
}
"#;

    const UTILS: &str = r#"import { clsx, type ClassValue } from 'clsx'
import { twMerge } from 'tailwind-merge'

export function cn(...inputs: ClassValue[]) {
  return twMerge(clsx(inputs))
}
"#;

    const BIOME: &str = r#"{
  "$schema": "https://biomejs.dev/schemas/2.2.4/schema.json",
  "vcs": { "enabled": false, "clientKind": "git", "useIgnoreFile": false },
  "files": { "ignoreUnknown": false, "includes": ["**/src/**/*", "**/index.html", "**/vite.config.ts"] },
  "formatter": { "enabled": true, "indentStyle": "tab" },
  "linter": { "enabled": true, "rules": { "recommended": true } },
  "javascript": { "formatter": { "quoteStyle": "double" } }
}
"#;

    const ESLINT: &str = r#"// @ts-check

import { tanstackConfig } from '@tanstack/eslint-config'

export default [...tanstackConfig]
"#;

    const PRETTIER: &str = r#"// @ts-check

/** @type {import('prettier').Config} */
const config = {
  semi: false,
  singleQuote: true,
  trailingComma: 'all',
}

export default config
"#;

    const NETLIFY: &str = r#"[build]
  command = "vite build"
  publish = "dist"

[[redirects]]
  from = "/*"
  to = "/index.html"
  status = 200
"#;

    const VERCEL: &str = r#"{
  "rewrites": [{ "source": "/(.*)", "destination": "/index.html" }]
}
"#;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
