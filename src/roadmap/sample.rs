//! Built-in example roadmap.

use serde_json::{Value, json};

/// Example roadmap loaded on start and by the "Load sample" button.
pub fn sample_document() -> Value {
	json!({
		"title": "Frontend Development Roadmap 2025",
		"nodes": [
			{ "id": "html_css", "title": "HTML & CSS", "description": "Fundamentals of web structure and styling.", "status": "completed", "level": 0 },
			{ "id": "js_basics", "title": "JavaScript Basics", "description": "Core language features, DOM manipulation.", "status": "completed", "level": 1 },
			{ "id": "git", "title": "Version Control (Git)", "description": "Tracking changes and collaborating with teams.", "status": "completed", "level": 1 },
			{ "id": "framework", "title": "Choose a Framework", "description": "React, Vue, or Angular for building complex UIs.", "status": "in-progress", "level": 2 },
			{ "id": "react", "title": "React.js", "description": "Component-based architecture and state management.", "status": "in-progress", "level": 3 },
			{ "id": "vue", "title": "Vue.js", "description": "Approachable, performant, and versatile framework.", "status": "planned", "level": 3 },
			{ "id": "styling", "title": "Advanced CSS", "description": "CSS-in-JS, TailwindCSS, SASS.", "status": "in-progress", "level": 4 },
			{ "id": "testing", "title": "Testing", "description": "Jest, React Testing Library for robust apps.", "status": "planned", "level": 5 },
			{ "id": "typescript", "title": "TypeScript", "description": "Adding static types to JavaScript.", "status": "planned", "level": 5 },
			{ "id": "deployment", "title": "Deployment & CI/CD", "description": "Automating builds and deploying to production.", "status": "planned", "level": 6 }
		],
		"dependencies": [
			{ "from": "html_css", "to": "js_basics" },
			{ "from": "js_basics", "to": "framework" },
			{ "from": "js_basics", "to": "git" },
			{ "from": "framework", "to": "react" },
			{ "from": "framework", "to": "vue" },
			{ "from": "react", "to": "styling" },
			{ "from": "react", "to": "testing" },
			{ "from": "styling", "to": "deployment" },
			{ "from": "testing", "to": "typescript" }
		]
	})
}

/// Pretty-printed sample for the editor.
pub fn sample_text() -> String {
	serde_json::to_string_pretty(&sample_document()).unwrap_or_default()
}
